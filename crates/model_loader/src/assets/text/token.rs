//! Tokens produced by the lexer

use std::fmt;

use super::span::SourceSpan;

/// Statement keywords of both text formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// `v` - vertex position
    Vertex,
    /// `vt` - texture coordinate
    TexCoord,
    /// `vn` - vertex normal
    Normal,
    /// `f` - polygonal face
    Face,
    /// `g` - group name
    Group,
    /// `o` - object name
    Object,
    /// `s` - smoothing group toggle
    Smoothing,
    /// `mtllib` - material library reference
    MaterialLibrary,
    /// `usemtl` - bind a material
    UseMaterial,
    /// `newmtl` - material declaration
    NewMaterial,
    /// `Kd` - diffuse color
    Diffuse,
}

impl Keyword {
    /// Source spelling
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vertex => "v",
            Self::TexCoord => "vt",
            Self::Normal => "vn",
            Self::Face => "f",
            Self::Group => "g",
            Self::Object => "o",
            Self::Smoothing => "s",
            Self::MaterialLibrary => "mtllib",
            Self::UseMaterial => "usemtl",
            Self::NewMaterial => "newmtl",
            Self::Diffuse => "Kd",
        }
    }

    /// Whether the rest of the record is lexed as plain names
    pub const fn takes_names(self) -> bool {
        matches!(
            self,
            Self::Group | Self::Object | Self::MaterialLibrary | Self::UseMaterial | Self::NewMaterial
        )
    }
}

/// Which of the two text formats is being read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Geometry description (`.obj`)
    Model,
    /// Material library (`.mtl`)
    Material,
}

impl Dialect {
    /// Look up a record keyword
    pub fn keyword(self, word: &str) -> Option<Keyword> {
        let keyword = match (self, word) {
            (Self::Model, "v") => Keyword::Vertex,
            (Self::Model, "vt") => Keyword::TexCoord,
            (Self::Model, "vn") => Keyword::Normal,
            (Self::Model, "f") => Keyword::Face,
            (Self::Model, "g") => Keyword::Group,
            (Self::Model, "o") => Keyword::Object,
            (Self::Model, "s") => Keyword::Smoothing,
            (Self::Model, "mtllib") => Keyword::MaterialLibrary,
            (Self::Model, "usemtl") => Keyword::UseMaterial,
            (Self::Material, "newmtl") => Keyword::NewMaterial,
            (Self::Material, "Kd") => Keyword::Diffuse,
            _ => return None,
        };
        Some(keyword)
    }
}

/// Terminal symbol kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A known record keyword
    Keyword(Keyword),
    /// An unrecognised record keyword; the record is skipped
    Statement,
    /// Unsigned or signed integer literal
    Integer,
    /// Floating point literal
    Float,
    /// Slash-separated composite index (`1/2`, `1//3`, `1/2/3`)
    Index,
    /// Free-form word (group names, file names, `on`/`off`)
    Name,
    /// End of record
    Newline,
    /// A lexeme that could not be recognised; already reported
    Invalid,
    /// End of input
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(keyword) => write!(f, "`{}`", keyword.as_str()),
            Self::Statement => f.write_str("statement"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("number"),
            Self::Index => f.write_str("composite index"),
            Self::Name => f.write_str("name"),
            Self::Newline => f.write_str("end of line"),
            Self::Invalid => f.write_str("invalid token"),
            Self::Eof => f.write_str("end of file"),
        }
    }
}

/// Corner reference with optional texture and normal parts
///
/// Components keep their sign so relative (negative) references can be detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompositeIndex {
    /// Position index (1-based in source)
    pub vertex: i64,
    /// Texture coordinate index
    pub texture: Option<i64>,
    /// Normal index
    pub normal: Option<i64>,
}

impl CompositeIndex {
    /// A bare position reference
    pub const fn bare(vertex: i64) -> Self {
        Self { vertex, texture: None, normal: None }
    }

    /// Which parts are present
    pub const fn shape(&self) -> CornerShape {
        match (self.texture.is_some(), self.normal.is_some()) {
            (false, false) => CornerShape::Vertex,
            (true, false) => CornerShape::VertexTexture,
            (false, true) => CornerShape::VertexNormal,
            (true, true) => CornerShape::VertexTextureNormal,
        }
    }
}

/// The four face corner shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CornerShape {
    /// `v`
    Vertex,
    /// `v/t`
    VertexTexture,
    /// `v//n`
    VertexNormal,
    /// `v/t/n`
    VertexTextureNormal,
}

impl fmt::Display for CornerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "v",
            Self::VertexTexture => "v/t",
            Self::VertexNormal => "v//n",
            Self::VertexTextureNormal => "v/t/n",
        })
    }
}

/// Typed token payload
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer written without a sign
    UInt(u64),
    /// Integer written with a sign
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Name or keyword text
    Text(String),
    /// Composite index
    Index(CompositeIndex),
}

/// A lexed token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Terminal kind
    pub kind: TokenKind,
    /// Payload, if the kind carries one
    pub value: Option<Value>,
    /// Source location
    pub span: SourceSpan,
}

impl Token {
    /// Create a token without payload
    pub const fn new(kind: TokenKind, span: SourceSpan) -> Self {
        Self { kind, value: None, span }
    }

    /// Create a token with a payload
    pub const fn with_value(kind: TokenKind, value: Value, span: SourceSpan) -> Self {
        Self { kind, value: Some(value), span }
    }

    /// Numeric payload as a float, for any numeric kind
    pub fn as_number(&self) -> Option<f64> {
        match self.value {
            Some(Value::UInt(n)) => Some(n as f64),
            Some(Value::Int(n)) => Some(n as f64),
            Some(Value::Float(n)) => Some(n),
            _ => None,
        }
    }

    /// Text payload
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            Some(Value::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Integer or composite payload as a corner reference
    pub fn as_corner(&self) -> Option<CompositeIndex> {
        match self.value {
            Some(Value::UInt(n)) => Some(CompositeIndex::bare(i64::try_from(n).unwrap_or(i64::MAX))),
            Some(Value::Int(n)) => Some(CompositeIndex::bare(n)),
            Some(Value::Index(index)) => Some(index),
            _ => None,
        }
    }

    /// Whether this token ends a record
    pub const fn ends_record(&self) -> bool {
        matches!(self.kind, TokenKind::Newline | TokenKind::Eof)
    }

    /// Whether this token is a number usable as a coordinate
    pub const fn is_number(&self) -> bool {
        matches!(self.kind, TokenKind::Integer | TokenKind::Float)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn span() -> SourceSpan {
        SourceSpan::single_line(Arc::from("t.obj"), 1, 1, 1, Arc::from("f 1"))
    }

    #[test]
    fn test_keyword_lookup_depends_on_dialect() {
        assert_eq!(Dialect::Model.keyword("f"), Some(Keyword::Face));
        assert_eq!(Dialect::Material.keyword("f"), None);
        assert_eq!(Dialect::Material.keyword("Kd"), Some(Keyword::Diffuse));
        assert_eq!(Dialect::Model.keyword("Kd"), None);
    }

    #[test]
    fn test_corner_shapes() {
        let triple = CompositeIndex { vertex: 1, texture: Some(2), normal: Some(3) };
        assert_eq!(triple.shape(), CornerShape::VertexTextureNormal);
        assert_eq!(CompositeIndex::bare(4).shape(), CornerShape::Vertex);
        let normal_only = CompositeIndex { vertex: 1, texture: None, normal: Some(-1) };
        assert_eq!(normal_only.shape(), CornerShape::VertexNormal);
    }

    #[test]
    fn test_payload_accessors() {
        let int = Token::with_value(TokenKind::Integer, Value::UInt(3), span());
        assert_eq!(int.as_number(), Some(3.0));
        assert_eq!(int.as_corner(), Some(CompositeIndex::bare(3)));
        let name = Token::with_value(TokenKind::Name, Value::Text("cube".into()), span());
        assert_eq!(name.as_text(), Some("cube"));
        assert_eq!(name.as_number(), None);
    }
}
