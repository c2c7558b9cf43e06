//! Arithmetic expressions over named band values, used by band maths.
//!
//! Supported: numbers, band variables, `+ - * / ^`, unary minus, parentheses,
//! comparisons (`< <= > >= == !=`, evaluating to 1 or 0) and the functions
//! `abs sqrt exp ln log10 sin cos tan min max if(cond, then, else)`.

use crate::{Error, Result};

/// A named variable bound to a position in the band vector of a pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub band: usize,
}

impl Variable {
    pub fn new(name: impl Into<String>, band: usize) -> Self {
        Variable { name: name.into(), band }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    Compare(CompareOp),
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    Abs,
    Sqrt,
    Exp,
    Ln,
    Log10,
    Sin,
    Cos,
    Tan,
    Min,
    Max,
    If,
}

impl Function {
    fn from_name(name: &str) -> Option<Function> {
        Some(match name {
            "abs" => Function::Abs,
            "sqrt" => Function::Sqrt,
            "exp" => Function::Exp,
            "ln" => Function::Ln,
            "log10" => Function::Log10,
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "min" => Function::Min,
            "max" => Function::Max,
            "if" => Function::If,
            _ => return None,
        })
    }

    fn check_arity(self, name: &str, args: usize) -> Result<()> {
        let ok = match self {
            Function::Min | Function::Max => args >= 1,
            Function::If => args == 3,
            _ => args == 1,
        };

        if !ok {
            return Err(Error::Expression(format!("Invalid number of arguments ({args}) for function '{name}'")));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Number(f64),
    Band(usize),
    Negate(Box<Node>),
    Binary { op: char, lhs: Box<Node>, rhs: Box<Node> },
    Compare { op: CompareOp, lhs: Box<Node>, rhs: Box<Node> },
    Call { func: Function, args: Vec<Node> },
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '+' | '-' | '*' | '/' | '^' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '<' | '>' | '=' | '!' => {
                let (op, len) = match (c, next) {
                    ('<', Some('=')) => (CompareOp::LessEqual, 2),
                    ('<', _) => (CompareOp::Less, 1),
                    ('>', Some('=')) => (CompareOp::GreaterEqual, 2),
                    ('>', _) => (CompareOp::Greater, 1),
                    ('=', Some('=')) => (CompareOp::Equal, 2),
                    ('!', Some('=')) => (CompareOp::NotEqual, 2),
                    _ => return Err(Error::Expression(format!("Unexpected character '{c}' at position {i}"))),
                };
                tokens.push(Token::Compare(op));
                i += len;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }

                // exponent notation: 1e-3
                if i < chars.len() && matches!(chars[i], 'e' | 'E') {
                    let mut end = i + 1;
                    if end < chars.len() && matches!(chars[end], '+' | '-') {
                        end += 1;
                    }
                    if end < chars.len() && chars[end].is_ascii_digit() {
                        i = end;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }

                let number: String = chars[start..i].iter().collect();
                let value = number
                    .parse::<f64>()
                    .map_err(|_| Error::Expression(format!("Invalid number: {number}")))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            _ => return Err(Error::Expression(format!("Unexpected character '{c}' at position {i}"))),
        }
    }

    Ok(tokens)
}

/// Maximum depth of the expression tree, nested parentheses, unary operators and operator chains all count
const MAX_DEPTH: usize = 256;

struct Parser<'v> {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    variables: &'v [Variable],
}

impl Parser<'_> {
    fn descend(&mut self, levels: usize) -> Result<()> {
        self.depth += levels;
        if self.depth > MAX_DEPTH {
            return Err(Error::Expression(format!("Expression is nested deeper than {MAX_DEPTH} levels")));
        }

        Ok(())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            other => Err(Error::Expression(format!("Expected {expected:?}, found {other:?}"))),
        }
    }

    /// comparison = additive (compare additive)?
    fn parse_comparison(&mut self) -> Result<Node> {
        let lhs = self.parse_additive()?;
        if let Some(Token::Compare(op)) = self.peek() {
            let op = *op;
            self.advance();
            let rhs = self.parse_additive()?;
            return Ok(Node::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            });
        }

        Ok(lhs)
    }

    /// additive = term (('+' | '-') term)*
    fn parse_additive(&mut self) -> Result<Node> {
        let mut lhs = self.parse_term()?;
        let depth = self.depth;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            let op = *op;
            self.advance();
            self.descend(1)?;
            let rhs = self.parse_term()?;
            lhs = Node::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        self.depth = depth;
        Ok(lhs)
    }

    /// term = unary (('*' | '/') unary)*
    fn parse_term(&mut self) -> Result<Node> {
        let mut lhs = self.parse_unary()?;
        let depth = self.depth;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek() {
            let op = *op;
            self.advance();
            self.descend(1)?;
            let rhs = self.parse_unary()?;
            lhs = Node::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        self.depth = depth;
        Ok(lhs)
    }

    /// unary = ('-' | '+') unary | power
    fn parse_unary(&mut self) -> Result<Node> {
        self.descend(1)?;
        let node = self.parse_signed();
        self.depth -= 1;
        node
    }

    fn parse_signed(&mut self) -> Result<Node> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.advance();
                Ok(Node::Negate(Box::new(self.parse_unary()?)))
            }
            Some(Token::Op('+')) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    /// power = primary ('^' unary)?, right associative
    fn parse_power(&mut self) -> Result<Node> {
        let base = self.parse_primary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(Node::Binary {
                op: '^',
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }

        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Node> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(Node::Number(value)),
            Some(Token::LParen) => {
                let node = self.parse_comparison()?;
                self.expect(Token::RParen)?;
                Ok(node)
            }
            Some(Token::Ident(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.advance();
                    return self.parse_call(&name);
                }

                self.variables
                    .iter()
                    .find(|var| var.name == name)
                    .map(|var| Node::Band(var.band))
                    .ok_or_else(|| Error::Expression(format!("Unknown variable '{name}'")))
            }
            other => Err(Error::Expression(format!("Unexpected token: {other:?}"))),
        }
    }

    fn parse_call(&mut self, name: &str) -> Result<Node> {
        let func = Function::from_name(name).ok_or_else(|| Error::Expression(format!("Unknown function '{name}'")))?;

        let mut args = Vec::new();
        if let Some(Token::RParen) = self.peek() {
            self.advance();
        } else {
            loop {
                args.push(self.parse_comparison()?);
                match self.advance() {
                    Some(Token::Comma) => continue,
                    Some(Token::RParen) => break,
                    other => return Err(Error::Expression(format!("Expected ',' or ')' in call to '{name}', found {other:?}"))),
                }
            }
        }

        func.check_arity(name, args.len())?;
        Ok(Node::Call { func, args })
    }
}

fn evaluate(node: &Node, bands: &[f64]) -> f64 {
    match node {
        Node::Number(value) => *value,
        Node::Band(band) => bands.get(*band).copied().unwrap_or(f64::NAN),
        Node::Negate(inner) => -evaluate(inner, bands),
        Node::Binary { op, lhs, rhs } => {
            let l = evaluate(lhs, bands);
            let r = evaluate(rhs, bands);
            match op {
                '+' => l + r,
                '-' => l - r,
                '*' => l * r,
                '/' => l / r,
                '^' => l.powf(r),
                _ => f64::NAN,
            }
        }
        Node::Compare { op, lhs, rhs } => {
            let l = evaluate(lhs, bands);
            let r = evaluate(rhs, bands);
            let res = match op {
                CompareOp::Less => l < r,
                CompareOp::LessEqual => l <= r,
                CompareOp::Greater => l > r,
                CompareOp::GreaterEqual => l >= r,
                CompareOp::Equal => l == r,
                CompareOp::NotEqual => l != r,
            };
            if res { 1.0 } else { 0.0 }
        }
        Node::Call { func, args } => match func {
            Function::If => {
                if evaluate(&args[0], bands) != 0.0 {
                    evaluate(&args[1], bands)
                } else {
                    evaluate(&args[2], bands)
                }
            }
            Function::Min => args.iter().map(|arg| evaluate(arg, bands)).fold(f64::INFINITY, f64::min),
            Function::Max => args.iter().map(|arg| evaluate(arg, bands)).fold(f64::NEG_INFINITY, f64::max),
            _ => {
                let x = evaluate(&args[0], bands);
                match func {
                    Function::Abs => x.abs(),
                    Function::Sqrt => x.sqrt(),
                    Function::Exp => x.exp(),
                    Function::Ln => x.ln(),
                    Function::Log10 => x.log10(),
                    Function::Sin => x.sin(),
                    Function::Cos => x.cos(),
                    Function::Tan => x.tan(),
                    Function::If | Function::Min | Function::Max => f64::NAN,
                }
            }
        },
    }
}

fn highest_band(node: &Node) -> Option<usize> {
    match node {
        Node::Number(_) => None,
        Node::Band(band) => Some(*band),
        Node::Negate(inner) => highest_band(inner),
        Node::Binary { lhs, rhs, .. } | Node::Compare { lhs, rhs, .. } => highest_band(lhs).max(highest_band(rhs)),
        Node::Call { args, .. } => args.iter().filter_map(highest_band).max(),
    }
}

/// A parsed expression with its variables resolved to band positions
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    text: String,
    root: Node,
}

impl Expression {
    pub fn parse(text: &str, variables: &[Variable]) -> Result<Expression> {
        let mut parser = Parser {
            tokens: tokenize(text)?,
            pos: 0,
            depth: 0,
            variables,
        };

        let root = parser.parse_comparison()?;
        if let Some(token) = parser.peek() {
            return Err(Error::Expression(format!("Unexpected trailing token {token:?} in '{text}'")));
        }

        Ok(Expression {
            text: text.to_string(),
            root,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Position of the highest band referenced by the expression, `None` for constant expressions
    pub fn highest_band(&self) -> Option<usize> {
        highest_band(&self.root)
    }

    /// Evaluates the expression, bands outside of the band vector evaluate to NaN
    pub fn evaluate(&self, bands: &[f64]) -> f64 {
        evaluate(&self.root, bands)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn variables() -> Vec<Variable> {
        vec![Variable::new("a", 0), Variable::new("b", 1), Variable::new("nir", 2)]
    }

    fn eval(text: &str, bands: &[f64]) -> Result<f64> {
        Ok(Expression::parse(text, &variables())?.evaluate(bands))
    }

    #[test]
    fn operator_precedence() -> Result<()> {
        assert_eq!(eval("a + b * nir", &[1.0, 2.0, 3.0])?, 7.0);
        assert_eq!(eval("(a + b) * nir", &[1.0, 2.0, 3.0])?, 9.0);
        assert_eq!(eval("-a ^ 2", &[3.0, 0.0, 0.0])?, -9.0);
        assert_eq!(eval("2 ^ 3 ^ 2", &[])?, 512.0);
        assert_eq!(eval("a - b - nir", &[10.0, 2.0, 3.0])?, 5.0);
        assert_relative_eq!(eval("1.5e2 + 2E-1", &[])?, 150.2, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn functions_and_comparisons() -> Result<()> {
        assert_eq!(eval("if(a > b, a, b)", &[1.0, 2.0, 0.0])?, 2.0);
        assert_eq!(eval("max(a, b, nir)", &[1.0, 5.0, 3.0])?, 5.0);
        assert_eq!(eval("min(a, b)", &[1.0, 5.0])?, 1.0);
        assert_eq!(eval("a == 1", &[1.0])?, 1.0);
        assert_eq!(eval("a != 1", &[1.0])?, 0.0);
        assert_relative_eq!(eval("sqrt(abs(a)) + ln(exp(b))", &[-4.0, 3.0])?, 5.0, epsilon = 1e-12);
        assert_relative_eq!(eval("log10(100)", &[])?, 2.0);
        Ok(())
    }

    #[test]
    fn normalized_difference() -> Result<()> {
        assert_relative_eq!(eval("(nir - a) / (nir + a)", &[0.2, 0.0, 0.8])?, 0.6, epsilon = 1e-12);
        assert!(eval("a / b", &[1.0, 0.0])?.is_infinite());
        Ok(())
    }

    #[test]
    fn highest_band() -> Result<()> {
        assert_eq!(Expression::parse("a + nir", &variables())?.highest_band(), Some(2));
        assert_eq!(Expression::parse("max(1, b)", &variables())?.highest_band(), Some(1));
        assert_eq!(Expression::parse("3 * 4", &variables())?.highest_band(), None);
        Ok(())
    }

    #[test]
    fn nesting_is_limited() -> Result<()> {
        let nested = format!("{}a{}", "(".repeat(100_000), ")".repeat(100_000));
        assert!(matches!(Expression::parse(&nested, &variables()), Err(Error::Expression(_))));

        let negated = format!("{}a", "-".repeat(100_000));
        assert!(matches!(Expression::parse(&negated, &variables()), Err(Error::Expression(_))));

        let chain = vec!["a"; 100_000].join(" + ");
        assert!(matches!(Expression::parse(&chain, &variables()), Err(Error::Expression(_))));

        let powers = vec!["a"; 100_000].join(" ^ ");
        assert!(matches!(Expression::parse(&powers, &variables()), Err(Error::Expression(_))));

        let expr = Expression::parse(&format!("{}a{}", "(".repeat(50), ")".repeat(50)), &variables())?;
        assert_eq!(expr.evaluate(&[2.0]), 2.0);
        Ok(())
    }

    #[test]
    fn parse_errors() {
        for text in ["(a - ", "a b", "c + 1", "foo(a)", "if(a, b)", "a $ b", "a = b", "sqrt()"] {
            assert!(
                matches!(Expression::parse(text, &variables()), Err(Error::Expression(_))),
                "'{text}' should not parse"
            );
        }
    }
}
