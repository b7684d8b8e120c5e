pub mod create;
pub mod dispatch;
pub mod impact;
pub mod json_schema;
pub mod publish;
pub mod shared;
pub mod update;
pub mod validate;
