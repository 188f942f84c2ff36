mod expr;
mod field_info;
mod solver;
mod tag_index;
mod value;

pub use expr::{scoped_tag, tag, Expr, TagReference};
pub use field_info::{ExtractorInfo, FieldInfo, RunData};
pub use solver::{EvalError, SolverOrder};
pub use tag_index::TagIndex;
pub use value::Value;
