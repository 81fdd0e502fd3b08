//! Filter layer: typed filter trees, their JSON parser and the predicate compiler.
//!
//! ```text
//! JSON filter map --FilterMapParser--> FilterNode --PredicateCompiler--> Expression
//! ```

pub mod compiler;
pub mod node;
pub mod operator;
pub mod parameter;
pub mod parser;
pub mod transform;

pub use compiler::{CompiledFilter, PredicateCompiler};
pub use node::{FieldNode, FilterNode, LiteralNode};
pub use operator::{Arity, Operator, OperatorCategory};
pub use parameter::{parameters_to_filter, FilterParameter, ParameterOperator, RawFilterParameter};
pub use parser::FilterMapParser;
pub use transform::{FieldRemapper, FieldValuePair, FieldValueTransformer, IdentityTransformer};
