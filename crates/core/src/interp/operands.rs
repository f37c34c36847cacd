//! Operand stack values and typed pops.
//!
//! Operators pop their operands in reverse push order. A pop that finds the
//! wrong type (or nothing) yields `None`; the caller turns that into a no-op.

use serde::{Deserialize, Serialize};

use crate::utils::{Matrix, Point};

/// A value on the operand stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Number(f64),
    String(Vec<u8>),
    Name(String),
    Array(Vec<Operand>),
}

impl Operand {
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

pub fn pop_number(args: &mut Vec<Operand>) -> Option<f64> {
    args.pop().and_then(|t| match t {
        Operand::Number(n) if n.is_finite() => Some(n),
        _ => None,
    })
}

pub fn pop_int(args: &mut Vec<Operand>) -> Option<i64> {
    pop_number(args).map(|n| n as i64)
}

pub fn pop_string(args: &mut Vec<Operand>) -> Option<Vec<u8>> {
    args.pop().and_then(|t| match t {
        Operand::String(s) => Some(s),
        _ => None,
    })
}

pub fn pop_name(args: &mut Vec<Operand>) -> Option<String> {
    args.pop().and_then(|t| match t {
        Operand::Name(s) => Some(s),
        _ => None,
    })
}

pub fn pop_array(args: &mut Vec<Operand>) -> Option<Vec<Operand>> {
    args.pop().and_then(|t| match t {
        Operand::Array(items) => Some(items),
        _ => None,
    })
}

/// Pops an array and keeps its numeric entries.
pub fn pop_number_array(args: &mut Vec<Operand>) -> Option<Vec<f64>> {
    pop_array(args).map(|items| items.iter().filter_map(Operand::as_number).collect())
}

/// Pops exactly `N` numbers, returned in push order.
pub fn pop_numbers<const N: usize>(args: &mut Vec<Operand>) -> Option<[f64; N]> {
    if args.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for slot in out.iter_mut().rev() {
        *slot = pop_number(args)?;
    }
    Some(out)
}

pub fn pop_point(args: &mut Vec<Operand>) -> Option<Point> {
    let [x, y] = pop_numbers::<2>(args)?;
    Some((x, y))
}

pub fn pop_matrix(args: &mut Vec<Operand>) -> Option<Matrix> {
    let [a, b, c, d, e, f] = pop_numbers::<6>(args)?;
    Some((a, b, c, d, e, f))
}

/// Takes every trailing number on the stack, in push order.
pub fn drain_numbers(args: &mut Vec<Operand>) -> Vec<f64> {
    let mut out = Vec::new();
    while let Some(Operand::Number(n)) = args.last() {
        out.push(*n);
        args.pop();
    }
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_numbers_order() {
        let mut args = vec![
            Operand::Number(1.0),
            Operand::Number(2.0),
            Operand::Number(3.0),
        ];
        assert_eq!(pop_numbers::<2>(&mut args), Some([2.0, 3.0]));
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_pop_numbers_short_stack() {
        let mut args = vec![Operand::Number(1.0)];
        assert_eq!(pop_point(&mut args), None);
    }

    #[test]
    fn test_drain_numbers_stops_at_name() {
        let mut args = vec![
            Operand::Name("P0".into()),
            Operand::Number(0.5),
            Operand::Number(0.25),
        ];
        assert_eq!(drain_numbers(&mut args), vec![0.5, 0.25]);
        assert_eq!(args, vec![Operand::Name("P0".into())]);
    }
}
