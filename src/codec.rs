//! Binary NBT codec (Java edition layout, big-endian).
//!
//! The document is a single named `TAG_Compound`, optionally wrapped in gzip or
//! zlib. The wrapper is detected on read and reproduced on write so a repaired
//! file keeps the container format the game expects.
use std::borrow::Cow;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use log::{debug, warn};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::tag::{Compound, List, Scalar, Tag, TagError, TagKind};

/// Containers nested deeper than this are rejected instead of recursing on.
/// Matches the game's own limit and keeps every recursive pass (decode,
/// analyze, encode, drop) well inside a default thread stack.
pub const MAX_NESTING: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zlib,
}

/// A decoded document: root name, root tag, on-disk wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtFile {
    pub name: String,
    pub root: Tag,
    pub compression: Compression,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected end of data at offset {0}")]
    UnexpectedEof(usize),
    #[error("unknown tag id {id} at offset {offset}")]
    UnknownTag { id: u8, offset: usize },
    #[error("root tag must be a TAG_Compound, found id {0}")]
    UnexpectedRootTag(u8),
    #[error("negative length {len} at offset {offset}")]
    NegativeLength { len: i32, offset: usize },
    #[error("nesting exceeds {0} levels")]
    TooDeep(usize),
    #[error("invalid modified UTF-8 string at offset {0}")]
    InvalidString(usize),
    #[error("string of {0} bytes does not fit a TAG_String")]
    StringTooLong(usize),
    #[error("{0} elements do not fit an i32 length")]
    TooLong(usize),
    #[error(transparent)]
    Tag(#[from] TagError),
}

pub type Result<T> = std::result::Result<T, CodecError>;

// ————————————————————————————————————————————————————————————————————————————
// PUBLIC API
// ————————————————————————————————————————————————————————————————————————————

pub fn read_tree(path: &Path) -> Result<NbtFile> {
    let bytes = fs::read(path)?;
    from_bytes(&bytes)
}

/// Encode the whole document first, then replace `path` through a uniquely
/// named temporary file in the same directory. A failed write never leaves a
/// truncated document behind, and the temporary is removed on every error.
pub fn write_tree(file: &NbtFile, path: &Path) -> Result<()> {
    let bytes = to_bytes(file)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.persist(path).map_err(|err| err.error)?;
    debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

impl Compression {
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes {
            [0x1f, 0x8b, ..] => Self::Gzip,
            [0x78, ..] => Self::Zlib,
            _ => Self::None,
        }
    }
}

pub fn from_bytes(bytes: &[u8]) -> Result<NbtFile> {
    let compression = Compression::detect(bytes);
    let raw: Cow<[u8]> = match compression {
        Compression::None => Cow::Borrowed(bytes),
        Compression::Gzip => {
            let mut out = Vec::new();
            GzDecoder::new(bytes).read_to_end(&mut out)?;
            Cow::Owned(out)
        }
        Compression::Zlib => {
            let mut out = Vec::new();
            ZlibDecoder::new(bytes).read_to_end(&mut out)?;
            Cow::Owned(out)
        }
    };

    let mut reader = Reader { buf: &raw, pos: 0 };
    let id = reader.u8()?;
    if id != TagKind::Compound.id() {
        return Err(CodecError::UnexpectedRootTag(id));
    }
    let name = reader.string()?;
    let root = reader.payload(TagKind::Compound, 0)?;
    if reader.pos < raw.len() {
        warn!("ignoring {} trailing bytes after the root tag", raw.len() - reader.pos);
    }
    Ok(NbtFile { name, root, compression })
}

pub fn to_bytes(file: &NbtFile) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.push(file.root.kind().id());
    put_string(&mut out, &file.name)?;
    put_payload(&mut out, &file.root)?;

    match file.compression {
        Compression::None => Ok(out),
        Compression::Gzip => {
            let mut enc = GzEncoder::new(Vec::new(), flate2::Compression::default());
            enc.write_all(&out)?;
            Ok(enc.finish()?)
        }
        Compression::Zlib => {
            let mut enc = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            enc.write_all(&out)?;
            Ok(enc.finish()?)
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DECODING
// ————————————————————————————————————————————————————————————————————————————

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.buf.len());
        let Some(end) = end else {
            return Err(CodecError::UnexpectedEof(self.pos));
        };
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }
    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }
    fn i16(&mut self) -> Result<i16> {
        self.array().map(i16::from_be_bytes)
    }
    fn u16(&mut self) -> Result<u16> {
        self.array().map(u16::from_be_bytes)
    }
    fn i32(&mut self) -> Result<i32> {
        self.array().map(i32::from_be_bytes)
    }
    fn i64(&mut self) -> Result<i64> {
        self.array().map(i64::from_be_bytes)
    }
    fn f32(&mut self) -> Result<f32> {
        self.array().map(f32::from_be_bytes)
    }
    fn f64(&mut self) -> Result<f64> {
        self.array().map(f64::from_be_bytes)
    }
    fn len(&mut self) -> Result<usize> {
        let offset = self.pos;
        let len = self.i32()?;
        usize::try_from(len).map_err(|_| CodecError::NegativeLength { len, offset })
    }
    fn kind(&mut self) -> Result<TagKind> {
        let offset = self.pos;
        let id = self.u8()?;
        TagKind::from_id(id).ok_or(CodecError::UnknownTag { id, offset })
    }
    fn string(&mut self) -> Result<String> {
        let len = self.u16()? as usize;
        let offset = self.pos;
        let bytes = self.take(len)?;
        decode_mutf8(bytes).ok_or(CodecError::InvalidString(offset))
    }
    /// Read `len` fixed-width items, checking the byte budget before allocating.
    fn items<T, const N: usize>(&mut self, decode: fn([u8; N]) -> T) -> Result<Vec<T>> {
        let len = self.len()?;
        let bytes = self.take(len.checked_mul(N).ok_or(CodecError::UnexpectedEof(self.pos))?)?;
        Ok(bytes
            .chunks_exact(N)
            .map(|chunk| {
                let mut raw = [0u8; N];
                raw.copy_from_slice(chunk);
                decode(raw)
            })
            .collect())
    }

    fn payload(&mut self, kind: TagKind, nesting: usize) -> Result<Tag> {
        let tag = match kind {
            TagKind::End => {
                return Err(CodecError::UnknownTag { id: 0, offset: self.pos.saturating_sub(1) });
            }
            TagKind::Byte => Scalar::Byte(self.u8()? as i8).into(),
            TagKind::Short => Scalar::Short(self.i16()?).into(),
            TagKind::Int => Scalar::Int(self.i32()?).into(),
            TagKind::Long => Scalar::Long(self.i64()?).into(),
            TagKind::Float => Scalar::Float(self.f32()?).into(),
            TagKind::Double => Scalar::Double(self.f64()?).into(),
            TagKind::ByteArray => Scalar::ByteArray(self.items(|[b]: [u8; 1]| b as i8)?).into(),
            TagKind::String => Scalar::String(self.string()?).into(),
            TagKind::IntArray => Scalar::IntArray(self.items(i32::from_be_bytes)?).into(),
            TagKind::LongArray => Scalar::LongArray(self.items(i64::from_be_bytes)?).into(),
            TagKind::List => {
                if nesting >= MAX_NESTING {
                    return Err(CodecError::TooDeep(MAX_NESTING));
                }
                let elem = self.kind()?;
                let len = self.len()?;
                if elem == TagKind::End && len > 0 {
                    return Err(TagError::UntypedNonEmpty(len).into());
                }
                // every element takes at least one byte; cap the up-front allocation
                let mut items = Vec::with_capacity(len.min(self.buf.len() - self.pos));
                for _ in 0..len {
                    items.push(self.payload(elem, nesting + 1)?);
                }
                Tag::List(List::new(elem, items)?)
            }
            TagKind::Compound => {
                if nesting >= MAX_NESTING {
                    return Err(CodecError::TooDeep(MAX_NESTING));
                }
                let mut map = Compound::new();
                loop {
                    let child = self.kind()?;
                    if child == TagKind::End {
                        break;
                    }
                    let name = self.string()?;
                    let value = self.payload(child, nesting + 1)?;
                    map.insert(name, value);
                }
                Tag::Compound(map)
            }
        };
        Ok(tag)
    }
}

/// Java's modified UTF-8: NUL is `C0 80`, supplementary characters are
/// surrogate pairs of three-byte sequences.
fn decode_mutf8(bytes: &[u8]) -> Option<String> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Some(s.to_owned());
    }
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i] as u16;
        let cont = |k: usize| -> Option<u16> {
            let b = *bytes.get(i + k)?;
            (b & 0xC0 == 0x80).then_some((b & 0x3F) as u16)
        };
        if b0 < 0x80 {
            units.push(b0);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            units.push(((b0 & 0x1F) << 6) | cont(1)?);
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            units.push(((b0 & 0x0F) << 12) | (cont(1)? << 6) | cont(2)?);
            i += 3;
        } else {
            return None;
        }
    }
    String::from_utf16(&units).ok()
}

// ————————————————————————————————————————————————————————————————————————————
// ENCODING
// ————————————————————————————————————————————————————————————————————————————

fn encode_mutf8(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\0' => out.extend_from_slice(&[0xC0, 0x80]),
            c if (c as u32) < 0x10000 => {
                let mut buf = [0u8; 3];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            c => {
                let mut pair = [0u16; 2];
                for unit in c.encode_utf16(&mut pair).iter() {
                    let unit = *unit;
                    out.push(0xE0 | (unit >> 12) as u8);
                    out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                    out.push(0x80 | (unit & 0x3F) as u8);
                }
            }
        }
    }
    out
}

fn put_string(out: &mut Vec<u8>, s: &str) -> Result<()> {
    let bytes = encode_mutf8(s);
    let len = u16::try_from(bytes.len()).map_err(|_| CodecError::StringTooLong(bytes.len()))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&bytes);
    Ok(())
}

fn put_len(out: &mut Vec<u8>, len: usize) -> Result<()> {
    let len = i32::try_from(len).map_err(|_| CodecError::TooLong(len))?;
    out.extend_from_slice(&len.to_be_bytes());
    Ok(())
}

fn put_payload(out: &mut Vec<u8>, tag: &Tag) -> Result<()> {
    match tag {
        Tag::Leaf(scalar) => match scalar {
            Scalar::Byte(v) => out.push(*v as u8),
            Scalar::Short(v) => out.extend_from_slice(&v.to_be_bytes()),
            Scalar::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
            Scalar::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
            Scalar::Float(v) => out.extend_from_slice(&v.to_be_bytes()),
            Scalar::Double(v) => out.extend_from_slice(&v.to_be_bytes()),
            Scalar::ByteArray(vs) => {
                put_len(out, vs.len())?;
                out.extend(vs.iter().map(|v| *v as u8));
            }
            Scalar::String(s) => put_string(out, s)?,
            Scalar::IntArray(vs) => {
                put_len(out, vs.len())?;
                vs.iter().for_each(|v| out.extend_from_slice(&v.to_be_bytes()));
            }
            Scalar::LongArray(vs) => {
                put_len(out, vs.len())?;
                vs.iter().for_each(|v| out.extend_from_slice(&v.to_be_bytes()));
            }
        },
        Tag::List(list) => {
            out.push(list.elem().id());
            put_len(out, list.len())?;
            for item in list.items() {
                put_payload(out, item)?;
            }
        }
        Tag::Compound(map) => {
            for (name, value) in map {
                out.push(value.kind().id());
                put_string(out, name)?;
                put_payload(out, value)?;
            }
            out.push(TagKind::End.id());
        }
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
