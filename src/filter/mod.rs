//! Filter expressions: operators, criteria, the postfix parser and the
//! predicate builder

pub mod builder;
pub mod criteria;
pub mod operation;
pub mod parser;

pub use builder::{build_filter, build_flat, build_postfix, criterion_predicate};
pub use criteria::FilterCriteria;
pub use operation::{Connective, FilterOperation};
pub use parser::{parse_criterion, parse_filter, parse_optional, tokenize, PostfixToken, Token};
