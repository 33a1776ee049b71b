use crate::evaluator::{evaluate, EvalError, Operand};
use crate::input::Operation;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Val(Operand),
    Op(Operation),
}

/// The in-progress expression and the memory cells used for chaining.
///
/// The buffer alternates operand, operator, operand and holds at most three
/// tokens between actions; a fourth token collapses it through [`Calculator::calc`].
#[derive(Debug, Default)]
pub struct Calculator {
    buffer: Vec<Token>,
    last_number: Option<Operand>,
    last_operator: Option<Operation>,
}

impl Calculator {
    pub fn push_digit(&mut self, digit: u8) -> Result<(), EvalError> {
        match self.buffer.last_mut() {
            Some(Token::Val(operand)) => {
                operand.push_digit(digit);
                Ok(())
            }
            None | Some(Token::Op(_)) => self.push_token(Token::Val(Operand::digit(digit))),
        }
    }

    pub fn push_operator(&mut self, op: Operation) -> Result<(), EvalError> {
        match self.buffer.last_mut() {
            Some(Token::Val(_)) => self.push_token(Token::Op(op)),
            Some(Token::Op(prev)) => {
                trace!(%prev, %op, "replacing operator");
                *prev = op;
                Ok(())
            }
            // Nothing to operate on yet
            None => Ok(()),
        }
    }

    pub fn push_dot(&mut self) -> Result<(), EvalError> {
        match self.buffer.last_mut() {
            Some(Token::Val(operand)) => {
                operand.push_dot();
                Ok(())
            }
            None | Some(Token::Op(_)) => self.push_token(Token::Val(Operand::zero_dot())),
        }
    }

    pub fn clear_all(&mut self) {
        self.buffer.clear();
        self.last_number = None;
        self.last_operator = None;
    }

    pub fn clear_entry(&mut self) {
        self.buffer.pop();
    }

    fn push_token(&mut self, token: Token) -> Result<(), EvalError> {
        self.buffer.push(token);
        if self.buffer.len() > 3 {
            debug!("buffer overflow, chaining");
            if let Err(e) = self.calc() {
                self.buffer.pop();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Collapses the buffer into a result, optionally followed by the
    /// operator that forced the evaluation.
    ///
    /// Nothing changes when evaluation fails.
    pub fn calc(&mut self) -> Result<(), EvalError> {
        let Some(Token::Val(first)) = self.buffer.first() else {
            return Ok(());
        };

        let operator = self.last_operator_in_buffer().or(self.last_operator);
        let mut last_number = self.last_number.clone();
        let mut carried = None;

        let (l, op, r) = match (self.buffer.as_slice(), operator) {
            ([Token::Val(l), Token::Op(op), Token::Val(r)], _) => {
                last_number = Some(r.clone());
                (l, *op, r.clone())
            }
            ([Token::Val(l), Token::Op(op), Token::Val(r), Token::Op(excess)], _) => {
                carried = Some(*excess);
                last_number = Some(Operand::from_value(evaluate(l, *op, r)?));
                (l, *op, r.clone())
            }
            // A bare number with nothing to apply
            (_, None) => return Ok(()),
            (_, Some(op)) => {
                let r = last_number.clone().ok_or(EvalError::Incomplete)?;
                last_number = Some(r.clone());
                (first, op, r)
            }
        };

        let mut result = evaluate(l, op, &r)?;
        debug!(%l, %op, %r, result, "evaluated");

        if carried == Some(Operation::Percent) {
            result /= 100.0;
            carried = None;
        }

        self.buffer.clear();
        self.buffer.push(Token::Val(Operand::from_value(result)));
        self.buffer.extend(carried.map(Token::Op));
        self.last_number = last_number;
        self.last_operator = operator;
        Ok(())
    }

    fn last_operator_in_buffer(&self) -> Option<Operation> {
        self.buffer.iter().rev().find_map(|t| match t {
            Token::Op(op) => Some(*op),
            Token::Val(_) => None,
        })
    }

    /// The operand closest to the end of the buffer.
    pub fn current_operand(&self) -> Option<&Operand> {
        self.buffer.iter().rev().find_map(|t| match t {
            Token::Val(operand) => Some(operand),
            Token::Op(_) => None,
        })
    }

    #[cfg(test)]
    pub fn buffer(&self) -> &[Token] {
        &self.buffer
    }

    #[cfg(test)]
    pub fn last_number(&self) -> Option<&Operand> {
        self.last_number.as_ref()
    }

    #[cfg(test)]
    pub fn last_operator(&self) -> Option<Operation> {
        self.last_operator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn enter(calculator: &mut Calculator, keys: &str) -> Result<(), EvalError> {
        for c in keys.chars() {
            match c {
                '0'..='9' => calculator.push_digit(c as u8 - b'0')?,
                '.' => calculator.push_dot()?,
                '=' => calculator.calc()?,
                _ => calculator.push_operator(Operation::from_char(c).unwrap())?,
            }
        }
        Ok(())
    }

    fn texts(calculator: &Calculator) -> Vec<String> {
        calculator
            .buffer()
            .iter()
            .map(|t| match t {
                Token::Val(operand) => operand.text().to_string(),
                Token::Op(op) => op.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_digit_concatenation() {
        let mut calculator = Calculator::default();
        enter(&mut calculator, "012").unwrap();
        assert_eq!(texts(&calculator), ["12"]);
    }

    #[test]
    fn test_operator_substitution() {
        let mut calculator = Calculator::default();
        enter(&mut calculator, "5+*").unwrap();
        assert_eq!(texts(&calculator), ["5", "*"]);
    }

    #[test]
    fn test_operator_on_empty_buffer() {
        let mut calculator = Calculator::default();
        enter(&mut calculator, "+").unwrap();
        assert!(calculator.buffer().is_empty());
    }

    #[test]
    fn test_auto_chain() {
        let mut calculator = Calculator::default();
        enter(&mut calculator, "2+3+").unwrap();
        assert_eq!(texts(&calculator), ["5", "+"]);
        enter(&mut calculator, "4").unwrap();
        assert_eq!(texts(&calculator), ["5", "+", "4"]);
        enter(&mut calculator, "=").unwrap();
        assert_eq!(texts(&calculator), ["9"]);
    }

    #[test]
    fn test_percent_of() {
        let mut calculator = Calculator::default();
        enter(&mut calculator, "200%10=").unwrap();
        assert_eq!(texts(&calculator), ["20"]);
    }

    #[test]
    fn test_trailing_percent() {
        let mut calculator = Calculator::default();
        enter(&mut calculator, "200*10%").unwrap();
        assert_eq!(texts(&calculator), ["20"]);
        assert_eq!(calculator.last_operator(), Some(Operation::Percent));
    }

    #[test]
    fn test_repeat_evaluate() {
        let mut calculator = Calculator::default();
        enter(&mut calculator, "2+3==").unwrap();
        assert_eq!(texts(&calculator), ["8"]);
        assert_eq!(calculator.last_number().map(Operand::text), Some("3"));
    }

    #[test]
    fn test_evaluate_with_missing_right_operand() {
        let mut calculator = Calculator::default();
        enter(&mut calculator, "2+3+").unwrap();
        // 5 + 5, the chained result stands in for the right operand
        enter(&mut calculator, "=").unwrap();
        assert_eq!(texts(&calculator), ["10"]);
        enter(&mut calculator, "=").unwrap();
        assert_eq!(texts(&calculator), ["15"]);
    }

    #[test]
    fn test_evaluate_without_any_right_operand() {
        let mut calculator = Calculator::default();
        assert_eq!(enter(&mut calculator, "7*="), Err(EvalError::Incomplete));
        assert_eq!(texts(&calculator), ["7", "*"]);
        assert_eq!(calculator.last_number(), None);

        enter(&mut calculator, "3=").unwrap();
        assert_eq!(texts(&calculator), ["21"]);
        // Repeats multiply by the remembered operand
        enter(&mut calculator, "=").unwrap();
        assert_eq!(texts(&calculator), ["63"]);
        assert_eq!(calculator.last_number().map(Operand::text), Some("3"));
    }

    #[test]
    fn test_evaluate_bare_number() {
        let mut calculator = Calculator::default();
        enter(&mut calculator, "=").unwrap();
        assert!(calculator.buffer().is_empty());
        enter(&mut calculator, "42=").unwrap();
        assert_eq!(texts(&calculator), ["42"]);
    }

    #[test]
    fn test_failed_evaluation_leaves_state() {
        let mut calculator = Calculator::default();
        enter(&mut calculator, "1+2=").unwrap();
        enter(&mut calculator, "/0").unwrap();
        assert_eq!(enter(&mut calculator, "="), Err(EvalError::NonFinite));
        assert_eq!(texts(&calculator), ["3", "/", "0"]);
        assert_eq!(calculator.last_number().map(Operand::text), Some("2"));
        assert_eq!(calculator.last_operator(), Some(Operation::Add));

        assert_eq!(enter(&mut calculator, "+"), Err(EvalError::NonFinite));
        assert_eq!(texts(&calculator), ["3", "/", "0"]);
    }

    #[test]
    fn test_dot() {
        let mut calculator = Calculator::default();
        enter(&mut calculator, ".5+.").unwrap();
        assert_eq!(texts(&calculator), ["0.5", "+", "0."]);
        enter(&mut calculator, "..25").unwrap();
        assert_eq!(texts(&calculator), ["0.5", "+", "0.25"]);
    }

    #[test]
    fn test_dot_on_result() {
        let mut calculator = Calculator::default();
        enter(&mut calculator, "1/4=.").unwrap();
        assert_eq!(texts(&calculator), ["0.25"]);
    }

    #[test]
    fn test_clear_entry() {
        let mut calculator = Calculator::default();
        enter(&mut calculator, "12+3").unwrap();
        calculator.clear_entry();
        assert_eq!(texts(&calculator), ["12", "+"]);
        assert_eq!(calculator.current_operand().map(Operand::text), Some("12"));
        calculator.clear_entry();
        calculator.clear_entry();
        calculator.clear_entry();
        assert!(calculator.buffer().is_empty());
    }

    #[test]
    fn test_clear_all() {
        let mut calculator = Calculator::default();
        enter(&mut calculator, "2+3=+").unwrap();
        calculator.clear_all();
        assert!(calculator.buffer().is_empty());
        assert_eq!(calculator.last_number(), None);
        assert_eq!(calculator.last_operator(), None);
        assert_eq!(calculator.current_operand(), None);
    }

    fn key() -> impl Strategy<Value = char> {
        prop::sample::select(vec![
            '0', '1', '5', '9', '.', '+', '-', '*', '/', '%', '=',
        ])
    }

    proptest! {
        #[test]
        fn test_alternation(keys in prop::collection::vec(key(), 0..40)) {
            let mut calculator = Calculator::default();
            for c in keys {
                let _ = enter(&mut calculator, &c.to_string());
                let buffer = calculator.buffer();
                prop_assert!(matches!(buffer.first(), None | Some(Token::Val(_))));
                for pair in buffer.windows(2) {
                    let same_kind = matches!(
                        pair,
                        [Token::Val(_), Token::Val(_)] | [Token::Op(_), Token::Op(_)]
                    );
                    prop_assert!(!same_kind);
                }
            }
        }

        #[test]
        fn test_second_dot_is_noop(digits in "[0-9]{0,6}") {
            let mut calculator = Calculator::default();
            enter(&mut calculator, &digits).unwrap();
            calculator.push_dot().unwrap();
            let once = texts(&calculator);
            calculator.push_dot().unwrap();
            prop_assert_eq!(texts(&calculator), once);
        }
    }
}
