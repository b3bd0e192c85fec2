//! Arithmetic problem generation

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::stage::StageConfig;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Sub,
}

impl Operator {
    pub fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
        }
    }
}

/// A single problem. Immutable once built; replaced wholesale each round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub operand1: u32,
    pub operand2: u32,
    pub operator: Operator,
    pub answer: u32,
}

impl Problem {
    /// Build a problem, ordering subtraction operands so the answer is non-negative
    pub fn new(operand1: u32, operand2: u32, operator: Operator) -> Self {
        let (operand1, operand2) = match operator {
            Operator::Sub if operand1 < operand2 => (operand2, operand1),
            _ => (operand1, operand2),
        };
        let answer = match operator {
            Operator::Add => operand1 + operand2,
            Operator::Sub => operand1 - operand2,
        };
        Self {
            operand1,
            operand2,
            operator,
            answer,
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} = ?",
            self.operand1,
            self.operator.symbol(),
            self.operand2
        )
    }
}

/// Draw a problem for a resolved stage
pub fn generate_problem<R: Rng + ?Sized>(rng: &mut R, config: &StageConfig) -> Problem {
    let operator = if config.subtraction_chance > 0.0 && rng.random_bool(config.subtraction_chance)
    {
        Operator::Sub
    } else {
        Operator::Add
    };

    let range = config.min_operand..=config.max_operand;
    let operand1 = rng.random_range(range.clone());
    let operand2 = rng.random_range(range);

    Problem::new(operand1, operand2, operator)
}

/// Draw a problem for a cumulative score
pub fn problem_for_score<R: Rng + ?Sized>(rng: &mut R, tuning: &Tuning, score: u32) -> Problem {
    generate_problem(rng, &tuning.resolve_stage(score))
}
