use serde::Deserialize;
use std::str::FromStr;
use tracing::info;

use crate::error::CalcError;
use crate::validator::validate_numbers;

#[derive(Clone, Default)]
pub struct CalculatorService;

#[derive(Debug, Clone, Deserialize)]
pub struct CalculateRequest {
    pub operation: String,
    pub n1: Option<String>,
    pub n2: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Sub,
    Multiply,
    Divide,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Sub => "sub",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
        }
    }
}

impl FromStr for Operation {
    type Err = CalcError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "add" => Ok(Operation::Add),
            "sub" => Ok(Operation::Sub),
            "multiply" => Ok(Operation::Multiply),
            "divide" => Ok(Operation::Divide),
            _ => Err(CalcError::InvalidOperation),
        }
    }
}

pub struct Calculator;

impl Calculator {
    pub fn evaluate(operation: Operation, n1: f64, n2: f64) -> Result<f64, CalcError> {
        match operation {
            Operation::Add => Ok(n1 + n2),
            Operation::Sub => Ok(n1 - n2),
            Operation::Multiply => Ok(n1 * n2),
            Operation::Divide => {
                // -0.0 もゼロとして扱う
                if n2 == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                Ok(n1 / n2)
            }
        }
    }
}

impl CalculatorService {
    pub fn new() -> Self {
        Self
    }

    /// 数値の検証、ログ出力、演算の順に処理する。
    ///
    /// 数値と演算名の両方が不正な場合は `InvalidNumberFormat` が優先される。
    pub fn calculate(&self, request: CalculateRequest) -> Result<f64, CalcError> {
        let (n1, n2) = validate_numbers(request.n1.as_deref(), request.n2.as_deref())?;

        info!("Operation {} with parameters {} and {}", request.operation, n1, n2);

        let operation = request.operation.parse::<Operation>()?;
        Calculator::evaluate(operation, n1, n2)
    }
}
