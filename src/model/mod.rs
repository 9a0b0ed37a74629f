// File: ./src/model/mod.rs
pub mod dates;
pub mod display;
pub mod item;
pub mod matcher;
pub mod parser;
pub mod recurrence;
pub mod rule;

pub use display::TaskDisplay;
pub use item::{Schedule, Task, TaskBuilder, TaskLocation, TaskStatus};
pub use matcher::{DateComparison, DateField, Filter, Query, QueryError, Relation, TextField};
pub use recurrence::{Recurrence, RecurrenceEngine};
pub use rule::{Frequency, RecurrenceEnd, RecurrenceRule};
