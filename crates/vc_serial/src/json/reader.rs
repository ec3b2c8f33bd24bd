use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::mem;
use core::net::SocketAddr;
use std::collections::HashMap;
use std::io::Read;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::codec::{self, FormatRead, MemberCursor, SequenceCursor, SharedRead};
use crate::info::{MemberDescriptor, TypeDescriptor, TypeKind, Typed};
use crate::json::TYPE_KEY;
use crate::json::date::parse_date_time;
use crate::json::number::{parse_decimal, parse_float, parse_integer, widen};
use crate::json::token::{TokenKind, TokenSet};
use crate::json::tokenizer::{Tokenizer, unexpected};
use crate::registry::{DefaultFactory, InstanceFactory, TypeResolver};
use crate::{Dynamic, Error, MalformedError, Reflect, RepeatedObjectPolicy, Result, SerialHooks, Settings};

/// How far an object was consumed while detecting the type of a dynamic slot.
enum Opened {
    /// Only `{`.
    Empty,
    /// `{`, the first key and its colon.
    Key(String),
    /// `{` and the whole `"__type": "..."` member.
    Typed,
}

// -----------------------------------------------------------------------------
// JsonReader

/// Reads object graphs from JSON text.
///
/// Static composites accept an optional leading `"__type"` member, which is
/// checked against the expected type. A [`Dynamic`] slot is typed from its
/// `"__type"` member through `resolver`, or else from the shape of the value:
///
/// | JSON | Rust |
/// |---|---|
/// | object without `"__type"` | `HashMap<String, Dynamic>` |
/// | array | `Vec<Dynamic>` |
/// | string | `String` |
/// | `true` / `false` | `bool` |
/// | `null` | `()` |
/// | number | `i16`, `i32`, `i64`, `f32`, `Decimal` or `f64`, the first that fits |
///
/// Unknown members are skipped.
///
/// # Examples
///
/// ```
/// use vc_serial::{Dynamic, Settings};
/// use vc_serial::json::JsonReader;
/// use vc_serial::registry::TypeRegistry;
///
/// let registry = TypeRegistry::new();
/// let mut reader = JsonReader::new("[1, \"two\"]", Settings::new(), &registry);
/// let items = reader.read::<Vec<Dynamic>>().unwrap();
///
/// assert_eq!(items[0].downcast_ref::<i16>(), Some(&1));
/// assert_eq!(items[1].downcast_ref::<String>().map(String::as_str), Some("two"));
/// ```
pub struct JsonReader<'r> {
    tokens: Tokenizer,
    settings: Settings,
    resolver: &'r dyn TypeResolver,
    factory: &'r dyn InstanceFactory,
    depth: usize,
    opened: Option<Opened>,
    /// First key of the object being started, consumed during type detection.
    first_key: Option<String>,
    /// Members of the object being started consumed during type detection.
    consumed: usize,
    /// Key of the current entry of a string-keyed map.
    map_key: Option<String>,
    /// For every open map, whether it is an array of `[key, value]` pairs.
    maps: Vec<bool>,
}

impl<'r> JsonReader<'r> {
    pub fn new(text: impl Into<String>, settings: Settings, resolver: &'r dyn TypeResolver) -> Self {
        Self {
            tokens: Tokenizer::new(text.into()),
            settings,
            resolver,
            factory: &DefaultFactory,
            depth: 0,
            opened: None,
            first_key: None,
            consumed: 0,
            map_key: None,
            maps: Vec::new(),
        }
    }

    /// Buffers all of `input`, which must be UTF-8.
    pub fn from_reader(
        mut input: impl Read,
        settings: Settings,
        resolver: &'r dyn TypeResolver,
    ) -> Result<Self> {
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        Ok(Self::new(text, settings, resolver))
    }

    /// Replaces the factory composites are created with.
    #[inline]
    pub fn with_factory(mut self, factory: &'r dyn InstanceFactory) -> Self {
        self.factory = factory;
        self
    }

    #[inline]
    pub fn read<T: Typed>(&mut self) -> Result<T> {
        self.read_with(&())
    }

    pub fn read_with<T: Typed>(&mut self, hooks: &dyn SerialHooks) -> Result<T> {
        let factory = self.factory;
        codec::read_object(self, hooks, factory)
    }

    /// Reads one value of type `ty`, or `None` if the shape is unsupported.
    pub fn try_read(&mut self, ty: &'static TypeDescriptor) -> Result<Option<Box<dyn Reflect>>> {
        self.try_read_with(ty, &())
    }

    pub fn try_read_with(
        &mut self,
        ty: &'static TypeDescriptor,
        hooks: &dyn SerialHooks,
    ) -> Result<Option<Box<dyn Reflect>>> {
        let factory = self.factory;
        codec::try_read_object(self, ty, hooks, factory)
    }

    // -------------------------------------------------------------------------
    // Tokens

    #[inline]
    fn string(&mut self) -> Result<String> {
        self.tokens.expect(TokenSet::STRING).map(|token| token.text)
    }

    /// Consumes the next token and reports it as unexpected.
    fn fail<T>(&mut self, expected: TokenSet) -> Result<T> {
        let token = self.tokens.next_token()?;
        Err(unexpected(&token, expected).into())
    }

    /// Skips one complete value.
    fn skip_value(&mut self) -> Result<()> {
        let token = self.tokens.expect(TokenSet::VALUE)?;
        match token.kind {
            TokenKind::BraceOpen | TokenKind::BracketOpen => self.skip_nested(1),
            _ => Ok(()),
        }
    }

    /// Skips tokens until `open` structures are closed.
    fn skip_nested(&mut self, mut open: usize) -> Result<()> {
        while open > 0 {
            let token = self.tokens.next_token()?;
            match token.kind {
                TokenKind::BraceOpen | TokenKind::BracketOpen => open += 1,
                TokenKind::BraceClose | TokenKind::BracketClose => open -= 1,
                TokenKind::End => {
                    return Err(unexpected(&token, TokenSet::BRACE_CLOSE | TokenSet::BRACKET_CLOSE).into());
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Skips the rest of the current value, including an object already opened.
    fn skip_rest(&mut self) -> Result<()> {
        match self.opened.take() {
            Some(_) => self.skip_nested(1),
            None => self.skip_value(),
        }
    }

    // -------------------------------------------------------------------------
    // Structure

    /// Enters a structure. Returns `false` if it must be skipped.
    fn enter(&mut self, ty: &'static TypeDescriptor) -> Result<bool> {
        let limit = self.settings.depth_limit;
        if self.depth >= limit {
            if self.settings.repeated_object_policy == RepeatedObjectPolicy::Fail {
                return Err(Error::DepthExceeded { limit });
            }
            log::warn!("depth limit {limit} reached, `{}` skipped", ty.path());
            return Ok(false);
        }
        self.depth += 1;
        Ok(true)
    }

    #[inline]
    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn begin_object(&mut self) -> Result<()> {
        self.first_key = None;
        self.consumed = 0;
        match self.opened.take() {
            None => {
                self.tokens.expect(TokenSet::BRACE_OPEN)?;
            }
            Some(Opened::Empty) => {}
            Some(Opened::Key(key)) => self.first_key = Some(key),
            Some(Opened::Typed) => self.consumed = 1,
        }
        Ok(())
    }

    /// Reads the next key and its colon, or the closing brace.
    ///
    /// `index` counts the members of this object read so far.
    fn next_key(&mut self, index: &mut usize) -> Result<Option<String>> {
        if *index == 0 {
            *index = mem::take(&mut self.consumed);
        }
        if let Some(key) = self.first_key.take() {
            *index += 1;
            return Ok(Some(key));
        }
        let expected = if *index == 0 {
            TokenSet::STRING | TokenSet::BRACE_CLOSE
        } else {
            TokenSet::COMMA | TokenSet::BRACE_CLOSE
        };
        let token = self.tokens.expect(expected)?;
        let key = match token.kind {
            TokenKind::BraceClose => return Ok(None),
            TokenKind::Comma => self.string()?,
            _ => token.text,
        };
        self.tokens.expect(TokenSet::COLON)?;
        *index += 1;
        Ok(Some(key))
    }

    /// Advances to the next array element, consuming the separator or the closing bracket.
    fn next_item(&mut self, cursor: &mut SequenceCursor) -> Result<bool> {
        let kind = self.tokens.peek_kind()?;
        match (cursor.index, kind) {
            (_, TokenKind::BracketClose) => {
                self.tokens.next_token()?;
                return Ok(false);
            }
            (0, kind) if TokenSet::VALUE.contains(kind.into()) => {}
            (0, _) => return self.fail(TokenSet::VALUE | TokenSet::BRACKET_CLOSE),
            _ => {
                self.tokens.expect(TokenSet::COMMA | TokenSet::BRACKET_CLOSE)?;
            }
        }
        cursor.index += 1;
        Ok(true)
    }

    #[inline]
    fn in_pairs(&self) -> bool {
        self.maps.last().copied().unwrap_or(false)
    }

    /// Types a dynamic object from its first member.
    fn detect_object(&mut self) -> Result<&'static TypeDescriptor> {
        let untyped = <HashMap<String, Dynamic>>::type_descriptor();
        if self.tokens.peek_kind()? == TokenKind::BraceClose {
            self.opened = Some(Opened::Empty);
            return Ok(untyped);
        }
        let key = self.string()?;
        self.tokens.expect(TokenSet::COLON)?;
        if key != TYPE_KEY {
            self.opened = Some(Opened::Key(key));
            return Ok(untyped);
        }

        let path = self.string()?;
        let ty = self.resolver.require(&path)?;
        match ty.kind() {
            TypeKind::Composite(_) => {}
            TypeKind::Map(info) if info.key().is::<String>() => {}
            _ => {
                return Err(MalformedError::TypeTagMismatch {
                    expected: "an object type".into(),
                    found: path,
                }
                .into());
            }
        }
        self.opened = Some(Opened::Typed);
        Ok(ty)
    }
}

macro_rules! read_integer {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            fn $name(&mut self) -> Result<$ty> {
                let token = self.tokens.expect(TokenSet::NUMBERS)?;
                parse_integer(token.kind, &token.text, stringify!($ty))
            }
        )*
    };
}

macro_rules! read_float {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            fn $name(&mut self) -> Result<$ty> {
                let token = self.tokens.expect(TokenSet::NUMBERS | TokenSet::STRING)?;
                parse_float(token.kind, &token.text, stringify!($ty))
            }
        )*
    };
}

// -----------------------------------------------------------------------------
// FormatRead

impl FormatRead for JsonReader<'_> {
    #[inline]
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn reset_session(&mut self) {
        self.depth = 0;
        self.opened = None;
        self.first_key = None;
        self.consumed = 0;
        self.map_key = None;
        self.maps.clear();
    }

    fn finish_session(&mut self) -> Result<()> {
        self.tokens.expect(TokenSet::END).map(|_| ())
    }

    fn read_unit(&mut self) -> Result<()> {
        self.tokens.expect(TokenSet::NULL).map(|_| ())
    }

    fn read_bool(&mut self) -> Result<bool> {
        let token = self.tokens.expect(TokenSet::BOOLEANS)?;
        Ok(token.kind == TokenKind::True)
    }

    read_integer! {
        read_i8: i8,
        read_i16: i16,
        read_i32: i32,
        read_i64: i64,
        read_u8: u8,
        read_u16: u16,
        read_u32: u32,
        read_u64: u64,
    }

    read_float! {
        read_f32: f32,
        read_f64: f64,
    }

    fn read_decimal(&mut self) -> Result<Decimal> {
        let token = self.tokens.expect(TokenSet::NUMBERS)?;
        parse_decimal(&token.text)
    }

    fn read_char(&mut self) -> Result<char> {
        let text = self.string()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(MalformedError::CharLength(text).into()),
        }
    }

    fn read_string(&mut self) -> Result<String> {
        match self.map_key.take() {
            Some(key) => Ok(key),
            None => self.string(),
        }
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let text = self.string()?;
        STANDARD
            .decode(text)
            .map_err(|_| MalformedError::InvalidBase64.into())
    }

    fn read_chars(&mut self) -> Result<Vec<char>> {
        Ok(self.string()?.chars().collect())
    }

    fn read_date_time(&mut self) -> Result<NaiveDateTime> {
        let token = self.tokens.expect(TokenSet::STRING | TokenSet::NUMBER)?;
        parse_date_time(&token.text)
    }

    fn read_uuid(&mut self) -> Result<Uuid> {
        let text = self.string()?;
        Uuid::parse_str(&text).map_err(|_| MalformedError::InvalidUuid(text).into())
    }

    fn read_socket_addr(&mut self) -> Result<SocketAddr> {
        let text = self.string()?;
        text.parse()
            .map_err(|_| MalformedError::InvalidAddress(text).into())
    }

    fn read_type_ref(&mut self) -> Result<&'static TypeDescriptor> {
        let path = self.string()?;
        self.resolver.require(&path)
    }

    fn read_presence(&mut self, _inner: &'static TypeDescriptor) -> Result<bool> {
        if self.tokens.peek_kind()? == TokenKind::Null {
            self.tokens.next_token()?;
            return Ok(false);
        }
        Ok(true)
    }

    #[inline]
    fn begin_shared(&mut self) -> Result<SharedRead> {
        Ok(SharedRead::First(0))
    }

    fn shared_value(&self, index: u32) -> Result<&dyn Reflect> {
        Err(MalformedError::InvalidReference { index, len: 0 }.into())
    }

    #[inline]
    fn complete_shared(&mut self, _index: u32, _value: Box<dyn Reflect>) -> Result<()> {
        Ok(())
    }

    fn read_dynamic_type(&mut self) -> Result<&'static TypeDescriptor> {
        match self.tokens.peek_kind()? {
            TokenKind::BraceOpen => {
                self.tokens.next_token()?;
                self.detect_object()
            }
            TokenKind::BracketOpen => Ok(<Vec<Dynamic>>::type_descriptor()),
            TokenKind::String => Ok(String::type_descriptor()),
            TokenKind::True | TokenKind::False => Ok(bool::type_descriptor()),
            TokenKind::Null => Ok(<()>::type_descriptor()),
            kind if kind.is_number() => widen(&self.tokens.peek()?.text),
            _ => self.fail(TokenSet::VALUE),
        }
    }

    fn begin_composite(&mut self, ty: &'static TypeDescriptor, _dynamic: bool) -> Result<bool> {
        if !self.enter(ty)? {
            self.skip_rest()?;
            return Ok(false);
        }
        self.begin_object()?;
        Ok(true)
    }

    fn next_member(
        &mut self,
        owner: &'static TypeDescriptor,
        members: &[MemberDescriptor],
        cursor: &mut MemberCursor,
    ) -> Result<Option<usize>> {
        loop {
            let Some(name) = self.next_key(&mut cursor.index)? else {
                return Ok(None);
            };
            if name == TYPE_KEY {
                let found = self.string()?;
                if found != owner.path() {
                    return Err(MalformedError::TypeTagMismatch {
                        expected: owner.path().into(),
                        found,
                    }
                    .into());
                }
                continue;
            }
            if let Some(index) = members.iter().position(|member| member.name() == name) {
                return Ok(Some(index));
            }
            log::debug!("ignoring unknown member `{name}` of `{}`", owner.path());
            self.skip_value()?;
        }
    }

    #[inline]
    fn end_composite(&mut self) -> Result<()> {
        self.leave();
        Ok(())
    }

    fn begin_sequence(&mut self, ty: &'static TypeDescriptor) -> Result<Option<SequenceCursor>> {
        if !self.enter(ty)? {
            self.skip_rest()?;
            return Ok(None);
        }
        self.tokens.expect(TokenSet::BRACKET_OPEN)?;
        Ok(Some(SequenceCursor::delimited()))
    }

    #[inline]
    fn next_element(&mut self, cursor: &mut SequenceCursor) -> Result<bool> {
        self.next_item(cursor)
    }

    #[inline]
    fn end_sequence(&mut self) -> Result<()> {
        self.leave();
        Ok(())
    }

    fn begin_map(
        &mut self,
        ty: &'static TypeDescriptor,
        key: &'static TypeDescriptor,
    ) -> Result<Option<SequenceCursor>> {
        if !self.enter(ty)? {
            self.skip_rest()?;
            return Ok(None);
        }
        let pairs = !key.is::<String>();
        if pairs {
            self.tokens.expect(TokenSet::BRACKET_OPEN)?;
        } else {
            self.begin_object()?;
        }
        self.maps.push(pairs);
        Ok(Some(SequenceCursor::delimited()))
    }

    fn next_entry(&mut self, cursor: &mut SequenceCursor) -> Result<bool> {
        if self.in_pairs() {
            if !self.next_item(cursor)? {
                return Ok(false);
            }
            self.tokens.expect(TokenSet::BRACKET_OPEN)?;
            return Ok(true);
        }
        match self.next_key(&mut cursor.index)? {
            Some(key) => {
                self.map_key = Some(key);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn begin_entry_value(&mut self) -> Result<()> {
        if self.in_pairs() {
            self.tokens.expect(TokenSet::COMMA)?;
        }
        Ok(())
    }

    fn end_entry(&mut self) -> Result<()> {
        if self.in_pairs() {
            self.tokens.expect(TokenSet::BRACKET_CLOSE)?;
        }
        Ok(())
    }

    fn end_map(&mut self) -> Result<()> {
        self.maps.pop();
        self.leave();
        Ok(())
    }

    #[inline]
    fn carries_element_types(&self) -> bool {
        false
    }

    fn read_element_type(&mut self) -> Result<&'static TypeDescriptor> {
        Ok(Dynamic::type_descriptor())
    }
}
