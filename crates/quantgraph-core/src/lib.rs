pub mod edge;
pub mod error;
pub mod formula;
pub mod graph;
pub mod guard;
pub mod id;
pub mod kind;
pub mod library;
pub mod mapping;
pub mod node;
pub mod pattern;
pub mod template;
pub mod value;

// Re-export commonly used types
pub use edge::{RelationEdge, RelationKind, RelationOp};
pub use error::CoreError;
pub use formula::{parse_equation, parse_expr, Equation, Expr, FormulaParseError};
pub use graph::{GraphMeta, NodeRef, ProblemGraph, ValueFilter};
pub use guard::{Cmp, Guard, GuardOperand, GuardParseError};
pub use id::{EdgeId, NodeId};
pub use kind::{QuantityFamily, QuantityKind};
pub use library::TemplateLibrary;
pub use mapping::Mapping;
pub use node::QuantityNode;
pub use pattern::{canonical_mode, Topic};
pub use template::{Template, TemplateError, TemplateSpec};
pub use value::Number;
