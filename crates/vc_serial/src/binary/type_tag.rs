use alloc::string::String;
use alloc::vec::Vec;
use std::io::{Read, Write};

use crate::binary::{BinaryReader, BinaryWriter};
use crate::info::TypeDescriptor;
use crate::info::TypeShape;
use crate::info::type_path::{array_path, generic_path, nested_path};
use crate::{Error, MalformedError, Result};

/// Nesting bound of type metadata, independent of the value depth limit.
const TAG_DEPTH_LIMIT: usize = 32;

/// Leading byte of encoded type metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum TypeTag {
    /// Full path string.
    Normal = 0,
    /// Length, then the element type.
    Array = 1,
    /// Declaring type, then the simple name.
    Nested = 2,
    /// Definition string, then each argument; arity comes from the resolver.
    Generic = 3,
}

impl TryFrom<u8> for TypeTag {
    type Error = MalformedError;

    fn try_from(byte: u8) -> Result<Self, MalformedError> {
        match byte {
            0 => Ok(Self::Normal),
            1 => Ok(Self::Array),
            2 => Ok(Self::Nested),
            3 => Ok(Self::Generic),
            other => Err(MalformedError::InvalidTypeTag(other)),
        }
    }
}

fn check_depth(depth: usize) -> Result<()> {
    if depth > TAG_DEPTH_LIMIT {
        return Err(Error::DepthExceeded {
            limit: TAG_DEPTH_LIMIT,
        });
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Write

impl<W: Write> BinaryWriter<W> {
    pub(super) fn write_type_tag(&mut self, ty: &'static TypeDescriptor) -> Result<()> {
        match ty.shape() {
            TypeShape::Plain => {
                self.write_raw(&[TypeTag::Normal as u8])?;
                self.write_string(ty.path())
            }
            TypeShape::Array { element, len } => {
                self.write_raw(&[TypeTag::Array as u8])?;
                self.write_len(*len)?;
                self.write_type_tag(element())
            }
            TypeShape::Nested { declaring } => {
                self.write_raw(&[TypeTag::Nested as u8])?;
                self.write_type_tag(declaring())?;
                self.write_string(ty.ident())
            }
            TypeShape::Generic {
                definition,
                arguments,
            } => {
                self.write_raw(&[TypeTag::Generic as u8])?;
                self.write_string(definition)?;
                arguments
                    .iter()
                    .try_for_each(|argument| self.write_type_tag(argument()))
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Read

impl<R: Read> BinaryReader<'_, R> {
    /// Reads type metadata and resolves it to a registered type.
    pub(super) fn read_type_tag(&mut self) -> Result<&'static TypeDescriptor> {
        self.resolve_type_tag(0)
    }

    fn resolve_type_tag(&mut self, depth: usize) -> Result<&'static TypeDescriptor> {
        check_depth(depth)?;
        match TypeTag::try_from(self.read_byte()?)? {
            TypeTag::Normal => {
                let path = self.read_utf8()?;
                self.resolver.require(&path)
            }
            TypeTag::Array => {
                let len = self.read_len()?;
                let element = self.resolve_type_tag(depth + 1)?;
                self.resolver
                    .resolve_array(element, len)
                    .ok_or_else(|| Error::UnknownType(array_path(element.path(), len)))
            }
            TypeTag::Nested => {
                let declaring = self.resolve_type_tag(depth + 1)?;
                let ident = self.read_utf8()?;
                self.resolver
                    .resolve_nested(declaring, &ident)
                    .ok_or_else(|| Error::UnknownType(nested_path(declaring.path(), &ident)))
            }
            TypeTag::Generic => {
                let definition = self.read_utf8()?;
                let arity = self
                    .resolver
                    .generic_arity(&definition)
                    .ok_or_else(|| Error::UnknownType(definition.clone()))?;
                let mut arguments = Vec::with_capacity(arity);
                for _ in 0..arity {
                    arguments.push(self.resolve_type_tag(depth + 1)?);
                }
                self.resolver
                    .resolve_generic(&definition, &arguments)
                    .ok_or_else(|| {
                        Error::UnknownType(generic_path(
                            &definition,
                            arguments.iter().map(|argument| argument.path()),
                        ))
                    })
            }
        }
    }

    /// Reads type metadata and checks it against `expected` without resolving.
    pub(super) fn expect_type_tag(&mut self, expected: &'static TypeDescriptor) -> Result<()> {
        match self.match_type_tag(expected, 0)? {
            None => Ok(()),
            Some(found) => Err(MalformedError::TypeTagMismatch {
                expected: expected.path().into(),
                found,
            }
            .into()),
        }
    }

    /// Returns what was found at the first point of divergence, if any.
    fn match_type_tag(&mut self, expected: &'static TypeDescriptor, depth: usize) -> Result<Option<String>> {
        check_depth(depth)?;
        let tag = TypeTag::try_from(self.read_byte()?)?;
        match (tag, expected.shape()) {
            (TypeTag::Normal, TypeShape::Plain) => {
                let path = self.read_utf8()?;
                Ok((path != expected.path()).then_some(path))
            }
            (TypeTag::Array, TypeShape::Array { element, len }) => {
                let found = self.read_len()?;
                if found != *len {
                    return Ok(Some(alloc::format!("array of length {found}")));
                }
                self.match_type_tag(element(), depth + 1)
            }
            (TypeTag::Nested, TypeShape::Nested { declaring }) => {
                if let Some(found) = self.match_type_tag(declaring(), depth + 1)? {
                    return Ok(Some(found));
                }
                let ident = self.read_utf8()?;
                Ok((ident != expected.ident()).then_some(ident))
            }
            (
                TypeTag::Generic,
                TypeShape::Generic {
                    definition,
                    arguments,
                },
            ) => {
                let found = self.read_utf8()?;
                if found != *definition {
                    return Ok(Some(found));
                }
                for argument in arguments.iter() {
                    if let Some(found) = self.match_type_tag(argument(), depth + 1)? {
                        return Ok(Some(found));
                    }
                }
                Ok(None)
            }
            (tag, _) => Ok(Some(alloc::format!("{tag:?} type metadata"))),
        }
    }
}
