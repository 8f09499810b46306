//! Numeric state variables: function expressions, comparisons and effects.
//! All numeric expressions are ground; variables refer to global numeric
//! fluents by [`FunctionIndex`].

use crate::common::FunctionIndex;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FunctionExpression {
    Constant(f64),
    Variable(FunctionIndex),
    Binary(
        BinaryOperator,
        Box<FunctionExpression>,
        Box<FunctionExpression>,
    ),
}

impl FunctionExpression {
    /// Evaluate against the numeric variable vector of a state. Division by
    /// zero and references to missing variables propagate as NaN.
    pub fn evaluate(&self, variables: &[OrderedFloat<f64>]) -> f64 {
        match self {
            FunctionExpression::Constant(value) => *value,
            FunctionExpression::Variable(index) => variables
                .get(*index as usize)
                .map_or(f64::NAN, |value| value.into_inner()),
            FunctionExpression::Binary(operator, lhs, rhs) => {
                let lhs = lhs.evaluate(variables);
                let rhs = rhs.evaluate(variables);
                match operator {
                    BinaryOperator::Add => lhs + rhs,
                    BinaryOperator::Sub => lhs - rhs,
                    BinaryOperator::Mul => lhs * rhs,
                    BinaryOperator::Div => {
                        if rhs == 0.0 {
                            f64::NAN
                        } else {
                            lhs / rhs
                        }
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericCondition {
    pub lhs: FunctionExpression,
    pub comparator: Comparator,
    pub rhs: FunctionExpression,
}

impl NumericCondition {
    pub fn new(lhs: FunctionExpression, comparator: Comparator, rhs: FunctionExpression) -> Self {
        Self {
            lhs,
            comparator,
            rhs,
        }
    }

    /// NaN on either side makes the condition false.
    pub fn holds(&self, variables: &[OrderedFloat<f64>]) -> bool {
        let lhs = self.lhs.evaluate(variables);
        let rhs = self.rhs.evaluate(variables);
        if lhs.is_nan() || rhs.is_nan() {
            return false;
        }
        match self.comparator {
            Comparator::Less => lhs < rhs,
            Comparator::LessEqual => lhs <= rhs,
            Comparator::Greater => lhs > rhs,
            Comparator::GreaterEqual => lhs >= rhs,
            Comparator::Equal => lhs == rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumericEffectKind {
    Assign,
    Increase,
    Decrease,
    ScaleUp,
    ScaleDown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericEffect {
    pub kind: NumericEffectKind,
    pub variable: FunctionIndex,
    pub expression: FunctionExpression,
}

impl NumericEffect {
    pub fn new(kind: NumericEffectKind, variable: FunctionIndex, expression: FunctionExpression) -> Self {
        Self {
            kind,
            variable,
            expression,
        }
    }

    /// Apply in place. Effects of one action are applied sequentially in
    /// declaration order.
    pub fn apply(&self, variables: &mut [OrderedFloat<f64>]) {
        let value = self.expression.evaluate(variables);
        let target = &mut variables[self.variable as usize];
        let current = target.into_inner();
        let updated = match self.kind {
            NumericEffectKind::Assign => value,
            NumericEffectKind::Increase => current + value,
            NumericEffectKind::Decrease => current - value,
            NumericEffectKind::ScaleUp => current * value,
            NumericEffectKind::ScaleDown => {
                if value == 0.0 {
                    f64::NAN
                } else {
                    current / value
                }
            }
        };
        *target = OrderedFloat(updated);
    }
}
