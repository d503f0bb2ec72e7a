//! Compression transforms and the method registry.
//!
//! A [`Codec`] turns a stream of uncompressed bytes into the stream stored in
//! the archive. Codecs are looked up by method id in a [`MethodRegistry`] that
//! the caller builds and hands to the [`ZipBuilder`](super::ZipBuilder).

use std::collections::HashMap;
use std::fmt;
use std::io::Read;

use flate2::Compression;
use flate2::read::DeflateEncoder;

use crate::error::{Result, ZipError};

use super::structures::{
    CompressionMethod, FLAG_DEFLATE_FAST, FLAG_DEFLATE_MAX, FLAG_DEFLATE_NORMAL,
    FLAG_DEFLATE_SUPERFAST, VERSION_DEFAULT, VERSION_DEFLATE,
};

/// A compression transform for one ZIP method.
pub trait Codec: Send + Sync {
    /// Method id written to the headers.
    fn method(&self) -> CompressionMethod;

    /// Minimum version needed to extract entries using this method.
    fn version_needed(&self) -> u16 {
        VERSION_DEFAULT
    }

    /// Method-specific general purpose flag bits (bits 1 and 2).
    fn flags(&self) -> u16 {
        0
    }

    /// Wrap `input` so that reading from the result yields compressed bytes.
    fn encoder<'a>(&self, input: Box<dyn Read + 'a>) -> Box<dyn Read + 'a>;
}

/// Method 0: data is stored as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreCodec;

impl Codec for StoreCodec {
    fn method(&self) -> CompressionMethod {
        CompressionMethod::Stored
    }

    fn encoder<'a>(&self, input: Box<dyn Read + 'a>) -> Box<dyn Read + 'a> {
        input
    }
}

/// Method 8: raw DEFLATE through `flate2`.
#[derive(Debug, Clone, Copy)]
pub struct DeflateCodec {
    level: Compression,
}

impl DeflateCodec {
    /// Create a codec with a level from 0 (none) to 9 (best).
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Codec for DeflateCodec {
    fn method(&self) -> CompressionMethod {
        CompressionMethod::Deflate
    }

    fn version_needed(&self) -> u16 {
        VERSION_DEFLATE
    }

    fn flags(&self) -> u16 {
        match self.level.level() {
            8..=9 => FLAG_DEFLATE_MAX,
            2 => FLAG_DEFLATE_FAST,
            0..=1 => FLAG_DEFLATE_SUPERFAST,
            _ => FLAG_DEFLATE_NORMAL,
        }
    }

    fn encoder<'a>(&self, input: Box<dyn Read + 'a>) -> Box<dyn Read + 'a> {
        Box::new(DeflateEncoder::new(input, self.level))
    }
}

/// Codecs available to a build, keyed by method id.
///
/// STORE is always present. [`MethodRegistry::default`] also registers DEFLATE.
pub struct MethodRegistry {
    codecs: HashMap<u16, Box<dyn Codec>>,
}

impl MethodRegistry {
    /// A registry that only knows STORE.
    pub fn new() -> Self {
        let mut registry = Self {
            codecs: HashMap::new(),
        };
        registry.register(StoreCodec);
        registry
    }

    /// Add a codec, replacing any codec registered for the same method.
    pub fn register<C: Codec + 'static>(&mut self, codec: C) -> &mut Self {
        self.codecs.insert(codec.method().as_u16(), Box::new(codec));
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<C: Codec + 'static>(mut self, codec: C) -> Self {
        self.register(codec);
        self
    }

    /// Look up the codec for `method`.
    pub fn resolve(&self, method: CompressionMethod) -> Result<&dyn Codec> {
        self.codecs
            .get(&method.as_u16())
            .map(|codec| codec.as_ref())
            .ok_or(ZipError::UnsupportedMethod {
                method: method.as_u16(),
            })
    }

    pub fn contains(&self, method: CompressionMethod) -> bool {
        self.codecs.contains_key(&method.as_u16())
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new().with(DeflateCodec::default())
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.codecs.keys().copied().collect();
        methods.sort_unstable();
        f.debug_struct("MethodRegistry")
            .field("methods", &methods)
            .finish()
    }
}
