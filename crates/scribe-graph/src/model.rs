//! Row types shared between the store, the extractor, and the
//! documentation runner.

use serde::{Deserialize, Serialize};

/// Symbol categories the pipeline records. Anything a language server
/// reports outside this set is mapped to `Other` and skipped when
/// scheduling documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Constructor,
    Class,
    Struct,
    Enum,
    Interface,
    Module,
    Constant,
    Variable,
    Other,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Class => "class",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
            SymbolKind::Interface => "interface",
            SymbolKind::Module => "module",
            SymbolKind::Constant => "constant",
            SymbolKind::Variable => "variable",
            SymbolKind::Other => "other",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "function" => SymbolKind::Function,
            "method" => SymbolKind::Method,
            "constructor" => SymbolKind::Constructor,
            "class" => SymbolKind::Class,
            "struct" => SymbolKind::Struct,
            "enum" => SymbolKind::Enum,
            "interface" => SymbolKind::Interface,
            "module" => SymbolKind::Module,
            "constant" => SymbolKind::Constant,
            "variable" => SymbolKind::Variable,
            _ => SymbolKind::Other,
        }
    }

    /// Kinds worth documenting on their own.
    pub fn is_documentable(&self) -> bool {
        matches!(
            self,
            SymbolKind::Function
                | SymbolKind::Method
                | SymbolKind::Constructor
                | SymbolKind::Class
                | SymbolKind::Struct
                | SymbolKind::Enum
                | SymbolKind::Interface
        )
    }
}

/// How one symbol relates to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Calls,
    Inherits,
    Uses,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Calls => "calls",
            RelationKind::Inherits => "inherits",
            RelationKind::Uses => "uses",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "inherits" => RelationKind::Inherits,
            "uses" => RelationKind::Uses,
            _ => RelationKind::Calls,
        }
    }
}

/// Zero-based line and character, matching the wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceRange {
    pub fn contains(&self, pos: SourcePosition) -> bool {
        pos >= self.start && pos <= self.end
    }

    pub fn contains_range(&self, other: &SourceRange) -> bool {
        self.contains(other.start) && self.contains(other.end)
    }

    /// Lines spanned, inclusive.
    pub fn line_count(&self) -> u32 {
        self.end.line.saturating_sub(self.start.line) + 1
    }
}

/// A symbol as the extractor hands it to the store. `parent` indexes
/// into the same batch, so a whole file can be inserted atomically
/// with parent ids resolved inside the transaction.
#[derive(Debug, Clone)]
pub struct NewSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub detail: Option<String>,
    /// Full extent, body included.
    pub range: SourceRange,
    /// The identifier itself; where reference lookups point.
    pub selection: SourceRange,
    pub parent: Option<usize>,
}

/// A symbol as stored.
#[derive(Debug, Clone)]
pub struct SymbolRow {
    pub id: i64,
    pub file_id: i64,
    pub name: String,
    pub kind: SymbolKind,
    pub detail: Option<String>,
    pub range: SourceRange,
    pub selection: SourceRange,
    pub parent_id: Option<i64>,
    pub documented: bool,
}

/// Per-project scan bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    pub aggregate_digest: Option<String>,
    pub scan_complete: bool,
}

/// Structured documentation for one symbol, stored as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedDoc {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParamDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<ReturnDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raises: Vec<RaiseDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDoc {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaiseDoc {
    pub exception: String,
    pub condition: String,
}

/// What a generator sees about one callee of the symbol being
/// documented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalleeContext {
    pub name: String,
    pub kind: SymbolKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Everything the generator needs for one symbol: the symbol itself,
/// its file path, the enclosing symbol's name, and summaries of the
/// things it calls.
#[derive(Debug, Clone)]
pub struct SymbolContext {
    pub symbol: SymbolRow,
    pub file_path: String,
    pub parent_name: Option<String>,
    pub callees: Vec<CalleeContext>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32, character: u32) -> SourcePosition {
        SourcePosition { line, character }
    }

    #[test]
    fn range_containment_is_inclusive() {
        let range = SourceRange {
            start: pos(2, 4),
            end: pos(8, 0),
        };
        assert!(range.contains(pos(2, 4)));
        assert!(range.contains(pos(8, 0)));
        assert!(range.contains(pos(5, 99)));
        assert!(!range.contains(pos(2, 3)));
        assert!(!range.contains(pos(8, 1)));
    }

    #[test]
    fn kind_round_trips_through_db_text() {
        for kind in [
            SymbolKind::Function,
            SymbolKind::Method,
            SymbolKind::Class,
            SymbolKind::Other,
        ] {
            assert_eq!(SymbolKind::from_db(kind.as_str()), kind);
        }
        assert_eq!(SymbolKind::from_db("widget"), SymbolKind::Other);
    }

    #[test]
    fn doc_json_omits_empty_sections() {
        let doc = GeneratedDoc {
            summary: "Adds two numbers.".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json, serde_json::json!({ "summary": "Adds two numbers." }));
    }
}
