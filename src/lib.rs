pub mod calculator;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;
pub mod validator;


pub use calculator::{CalculateRequest, Calculator, CalculatorService, Operation};
pub use error::CalcError;
