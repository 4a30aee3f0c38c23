//! In-memory NBT tree.
//!
//! A document is a closed union of three node shapes: scalar leaves, homogeneous
//! lists and insertion-ordered compounds. Everything downstream (walker, reducer,
//! codec) matches on [`Tag`] exhaustively.
use std::fmt;
use indexmap::IndexMap;
use thiserror::Error;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Wire-level tag kind. The discriminant is the on-disk tag id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagKind {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

pub type Compound = IndexMap<String, Tag>;

/// Homogeneous list. The declared element kind survives even when empty.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    elem: TagKind,
    items: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Leaf(Scalar),
    List(List),
    Compound(Compound),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagError {
    #[error("list declared as {declared} cannot hold a {found} element")]
    Heterogeneous { declared: TagKind, found: TagKind },
    #[error("list of {0} elements must declare a concrete element kind")]
    UntypedNonEmpty(usize),
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TagKind {
    pub fn from_id(id: u8) -> Option<Self> {
        let kind = match id {
            0 => Self::End,
            1 => Self::Byte,
            2 => Self::Short,
            3 => Self::Int,
            4 => Self::Long,
            5 => Self::Float,
            6 => Self::Double,
            7 => Self::ByteArray,
            8 => Self::String,
            9 => Self::List,
            10 => Self::Compound,
            11 => Self::IntArray,
            12 => Self::LongArray,
            _ => return None,
        };
        Some(kind)
    }
    pub fn id(self) -> u8 {
        self as u8
    }
    pub fn name(self) -> &'static str {
        match self {
            Self::End => "TAG_End",
            Self::Byte => "TAG_Byte",
            Self::Short => "TAG_Short",
            Self::Int => "TAG_Int",
            Self::Long => "TAG_Long",
            Self::Float => "TAG_Float",
            Self::Double => "TAG_Double",
            Self::ByteArray => "TAG_Byte_Array",
            Self::String => "TAG_String",
            Self::List => "TAG_List",
            Self::Compound => "TAG_Compound",
            Self::IntArray => "TAG_Int_Array",
            Self::LongArray => "TAG_Long_Array",
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Scalar {
    pub fn kind(&self) -> TagKind {
        match self {
            Self::Byte(_) => TagKind::Byte,
            Self::Short(_) => TagKind::Short,
            Self::Int(_) => TagKind::Int,
            Self::Long(_) => TagKind::Long,
            Self::Float(_) => TagKind::Float,
            Self::Double(_) => TagKind::Double,
            Self::ByteArray(_) => TagKind::ByteArray,
            Self::String(_) => TagKind::String,
            Self::IntArray(_) => TagKind::IntArray,
            Self::LongArray(_) => TagKind::LongArray,
        }
    }
}

impl List {
    /// Build a list, checking every item against the declared kind.
    pub fn new(elem: TagKind, items: Vec<Tag>) -> Result<Self, TagError> {
        if elem == TagKind::End && !items.is_empty() {
            return Err(TagError::UntypedNonEmpty(items.len()));
        }
        if let Some(bad) = items.iter().find(|item| item.kind() != elem) {
            return Err(TagError::Heterogeneous { declared: elem, found: bad.kind() });
        }
        Ok(Self { elem, items })
    }
    pub fn empty(elem: TagKind) -> Self {
        Self { elem, items: Vec::new() }
    }
    pub fn elem(&self) -> TagKind {
        self.elem
    }
    pub fn items(&self) -> &[Tag] {
        &self.items
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    /// Swap the item at `index` for `item`, keeping the list homogeneous.
    /// Returns the displaced item, or `None` when `index` is out of range.
    pub fn replace(&mut self, index: usize, item: Tag) -> Result<Option<Tag>, TagError> {
        if item.kind() != self.elem {
            return Err(TagError::Heterogeneous { declared: self.elem, found: item.kind() });
        }
        Ok(self.items.get_mut(index).map(|slot| std::mem::replace(slot, item)))
    }
    /// Same declared kind, only the first `len` items.
    pub fn prefix(&self, len: usize) -> Self {
        let len = len.min(self.items.len());
        Self { elem: self.elem, items: self.items[..len].to_vec() }
    }
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Tag> {
        self.items.get_mut(index)
    }
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Self::Leaf(scalar) => scalar.kind(),
            Self::List(_) => TagKind::List,
            Self::Compound(_) => TagKind::Compound,
        }
    }
    pub fn is_container(&self) -> bool {
        !matches!(self, Self::Leaf(_))
    }
    /// Build a compound from `(key, tag)` pairs; later duplicates overwrite
    /// the value but keep the first key position.
    pub fn compound<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Tag)>,
    {
        Self::Compound(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
    pub fn list(elem: TagKind, items: Vec<Tag>) -> Result<Self, TagError> {
        List::new(elem, items).map(Self::List)
    }
    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Self::Compound(map) => Some(map),
            _ => None,
        }
    }
    pub fn as_list(&self) -> Option<&List> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }
}

impl From<Scalar> for Tag {
    fn from(scalar: Scalar) -> Self {
        Self::Leaf(scalar)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
