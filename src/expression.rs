use crate::error::OptimizerError;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Operand stack size of the evaluator; deeper expressions are rejected at compile time.
const STACK_SIZE: usize = 32;

/// Parser recursion limit for parentheses, calls, signs and exponents.
const MAX_NESTING: usize = 256;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<num>(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)|(?P<ident>[A-Za-z_][A-Za-z0-9_]*)|(?P<op>[-+*/%^()]))",
    )
    .expect("token pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("expression is empty")]
    Empty,
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },
    #[error("unexpected '{0}'")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("number '{0}' is not finite")]
    InvalidNumber(String),
    #[error("unknown identifier '{name}'. Available variables: [{available}]")]
    UnknownIdentifier { name: String, available: String },
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("expression nests too deeply")]
    TooDeep,
    #[error("expected {expected} variables, got {actual}")]
    ParamCount { expected: usize, actual: usize },
    #[error("division by zero")]
    DivisionByZero,
    #[error("result {0} is outside the function's domain")]
    NonFinite(f64),
}

/// One-argument functions callable from an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    Sqrt,
    Exp,
    Ln,
    Log10,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Floor,
    Ceil,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "abs" => Self::Abs,
            "sqrt" => Self::Sqrt,
            "exp" => Self::Exp,
            "ln" => Self::Ln,
            "log" | "log10" => Self::Log10,
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            _ => return None,
        })
    }

    #[inline]
    fn apply(self, x: f64) -> f64 {
        match self {
            Self::Abs => x.abs(),
            Self::Sqrt => x.sqrt(),
            Self::Exp => x.exp(),
            Self::Ln => x.ln(),
            Self::Log10 => x.log10(),
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Asin => x.asin(),
            Self::Acos => x.acos(),
            Self::Atan => x.atan(),
            Self::Sinh => x.sinh(),
            Self::Cosh => x.cosh(),
            Self::Tanh => x.tanh(),
            Self::Floor => x.floor(),
            Self::Ceil => x.ceil(),
        }
    }
}

/// Compact bytecode instruction
#[derive(Debug, Clone, Copy)]
enum OpCode {
    LoadParam(usize),
    LoadConst(usize),
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Neg,
    Call(Function),
}

/// Compiled expression - data-oriented layout for cache efficiency
#[derive(Clone, Debug)]
pub struct CompiledExpression {
    instructions: Vec<OpCode>,
    constants: Vec<f64>, // Constant pool
    param_count: usize,
}

impl CompiledExpression {
    /// Compile `expr` against an explicit, ordered list of variable names.
    pub fn compile(expr: &str, param_names: &[String]) -> Result<Self, ExpressionError> {
        Compiler::new(param_names).compile(expr)
    }

    /// Compile `expr` with the variables `x1..xN` bound positionally.
    pub fn for_dimension(expr: &str, dimension: usize) -> Result<Self, ExpressionError> {
        Self::compile(expr, &variable_names(dimension))
    }

    #[inline]
    pub fn evaluate(&self, params: &[f64]) -> Result<f64, ExpressionError> {
        if params.len() != self.param_count {
            return Err(ExpressionError::ParamCount {
                expected: self.param_count,
                actual: params.len(),
            });
        }

        // The compiler bounds the depth, so the fixed stack never overflows
        let mut stack = [0.0f64; STACK_SIZE];
        let mut sp = 0usize;

        for &inst in &self.instructions {
            match inst {
                OpCode::LoadParam(idx) => {
                    stack[sp] = params[idx];
                    sp += 1;
                }
                OpCode::LoadConst(idx) => {
                    stack[sp] = self.constants[idx];
                    sp += 1;
                }
                OpCode::Add => {
                    sp -= 1;
                    stack[sp - 1] += stack[sp];
                }
                OpCode::Sub => {
                    sp -= 1;
                    stack[sp - 1] -= stack[sp];
                }
                OpCode::Mul => {
                    sp -= 1;
                    stack[sp - 1] *= stack[sp];
                }
                OpCode::Div | OpCode::Rem => {
                    sp -= 1;
                    let divisor = stack[sp];
                    if divisor == 0.0 {
                        return Err(ExpressionError::DivisionByZero);
                    }
                    if matches!(inst, OpCode::Div) {
                        stack[sp - 1] /= divisor;
                    } else {
                        stack[sp - 1] %= divisor;
                    }
                }
                OpCode::Pow => {
                    sp -= 1;
                    stack[sp - 1] = stack[sp - 1].powf(stack[sp]);
                }
                OpCode::Neg => stack[sp - 1] = -stack[sp - 1],
                OpCode::Call(func) => stack[sp - 1] = func.apply(stack[sp - 1]),
            }
        }

        let result = stack[0];
        if !result.is_finite() {
            return Err(ExpressionError::NonFinite(result));
        }
        Ok(result)
    }

    pub fn param_count(&self) -> usize {
        self.param_count
    }
}

/// Evaluate `expression` at `point`, binding `x1..xN` to its coordinates.
///
/// Every call compiles afresh; nothing is shared between calls.
pub fn evaluate(point: &[f64], expression: &str) -> Result<f64, OptimizerError> {
    CompiledExpression::for_dimension(expression, point.len())
        .and_then(|compiled| compiled.evaluate(point))
        .map_err(|e| OptimizerError::invalid_expression(expression, e))
}

/// Variable names `x1..xN`
pub fn variable_names(dimension: usize) -> Vec<String> {
    (1..=dimension).map(|i| format!("x{i}")).collect()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Ident(s) => s.clone(),
            Token::Op(c) => c.to_string(),
        }
    }
}

fn tokenize(expr: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < expr.len() {
        let rest = &expr[pos..];
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        pos += rest.len() - trimmed.len();

        let Some(caps) = TOKEN.captures(trimmed) else {
            let ch = trimmed.chars().next().unwrap_or_default();
            return Err(ExpressionError::UnexpectedCharacter { ch, position: pos });
        };

        if let Some(m) = caps.name("num") {
            let value: f64 = m
                .as_str()
                .parse()
                .map_err(|_| ExpressionError::InvalidNumber(m.as_str().to_string()))?;
            if !value.is_finite() {
                return Err(ExpressionError::InvalidNumber(m.as_str().to_string()));
            }
            tokens.push(Token::Number(value));
        } else if let Some(m) = caps.name("ident") {
            tokens.push(Token::Ident(m.as_str().to_string()));
        } else if let Some(m) = caps.name("op") {
            tokens.push(Token::Op(m.as_str().chars().next().unwrap_or_default()));
        }

        pos += caps.get(0).map_or(0, |m| m.end());
    }

    Ok(tokens)
}

struct Compiler<'a> {
    params: &'a [String],
    tokens: Vec<Token>,
    cursor: usize,
    instructions: Vec<OpCode>,
    constants: Vec<f64>,
    depth: usize,
    nesting: usize,
}

impl<'a> Compiler<'a> {
    fn new(params: &'a [String]) -> Self {
        Self {
            params,
            tokens: Vec::new(),
            cursor: 0,
            instructions: Vec::with_capacity(32),
            constants: Vec::with_capacity(8),
            depth: 0,
            nesting: 0,
        }
    }

    fn compile(mut self, expr: &str) -> Result<CompiledExpression, ExpressionError> {
        self.tokens = tokenize(expr)?;
        if self.tokens.is_empty() {
            return Err(ExpressionError::Empty);
        }

        self.parse_additive()?;

        if let Some(token) = self.peek() {
            return Err(ExpressionError::UnexpectedToken(token.describe()));
        }

        Ok(CompiledExpression {
            instructions: self.instructions,
            constants: self.constants,
            param_count: self.params.len(),
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned();
        self.cursor += 1;
        token
    }

    fn eat_op(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some(Token::Op(c)) if ops.contains(c) => {
                let c = *c;
                self.cursor += 1;
                Some(c)
            }
            _ => None,
        }
    }

    fn expect_op(&mut self, op: char) -> Result<(), ExpressionError> {
        match self.next() {
            Some(Token::Op(c)) if c == op => Ok(()),
            Some(other) => Err(ExpressionError::UnexpectedToken(other.describe())),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }

    fn push_operand(&mut self, op: OpCode) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > STACK_SIZE {
            return Err(ExpressionError::TooDeep);
        }
        self.instructions.push(op);
        Ok(())
    }

    fn push_binary(&mut self, op: OpCode) {
        self.depth -= 1;
        self.instructions.push(op);
    }

    fn add_const(&mut self, val: f64) -> usize {
        // Reuse existing constants
        if let Some(idx) = self.constants.iter().position(|&v| v == val) {
            return idx;
        }
        self.constants.push(val);
        self.constants.len() - 1
    }

    fn parse_additive(&mut self) -> Result<(), ExpressionError> {
        self.parse_multiplicative()?;
        while let Some(op) = self.eat_op(&['+', '-']) {
            self.parse_multiplicative()?;
            self.push_binary(if op == '+' { OpCode::Add } else { OpCode::Sub });
        }
        Ok(())
    }

    fn parse_multiplicative(&mut self) -> Result<(), ExpressionError> {
        self.parse_unary()?;
        while let Some(op) = self.eat_op(&['*', '/', '%']) {
            self.parse_unary()?;
            self.push_binary(match op {
                '*' => OpCode::Mul,
                '/' => OpCode::Div,
                _ => OpCode::Rem,
            });
        }
        Ok(())
    }

    /// Every nested construct recurses through here, so this is where depth is bounded.
    fn parse_unary(&mut self) -> Result<(), ExpressionError> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            return Err(ExpressionError::TooDeep);
        }
        let result = self.parse_signed();
        self.nesting -= 1;
        result
    }

    fn parse_signed(&mut self) -> Result<(), ExpressionError> {
        match self.eat_op(&['-', '+']) {
            Some('-') => {
                self.parse_unary()?;
                self.instructions.push(OpCode::Neg);
                Ok(())
            }
            Some(_) => self.parse_unary(),
            None => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<(), ExpressionError> {
        self.parse_atom()?;
        if self.eat_op(&['^']).is_some() {
            // Right associative, and the exponent may carry its own sign
            self.parse_unary()?;
            self.push_binary(OpCode::Pow);
        }
        Ok(())
    }

    fn parse_atom(&mut self) -> Result<(), ExpressionError> {
        match self.next() {
            None => Err(ExpressionError::UnexpectedEnd),
            Some(Token::Number(num)) => {
                let idx = self.add_const(num);
                self.push_operand(OpCode::LoadConst(idx))
            }
            Some(Token::Op('(')) => {
                self.parse_additive()?;
                self.expect_op(')')
            }
            Some(Token::Ident(name)) => self.parse_identifier(name),
            Some(other) => Err(ExpressionError::UnexpectedToken(other.describe())),
        }
    }

    fn parse_identifier(&mut self, name: String) -> Result<(), ExpressionError> {
        if matches!(self.peek(), Some(Token::Op('('))) {
            let func =
                Function::lookup(&name).ok_or_else(|| ExpressionError::UnknownFunction(name))?;
            self.cursor += 1;
            self.parse_additive()?;
            self.expect_op(')')?;
            self.instructions.push(OpCode::Call(func));
            return Ok(());
        }

        if let Some(idx) = self.params.iter().position(|p| *p == name) {
            return self.push_operand(OpCode::LoadParam(idx));
        }

        let constant = match name.as_str() {
            "pi" => Some(std::f64::consts::PI),
            "e" => Some(std::f64::consts::E),
            _ => None,
        };
        if let Some(val) = constant {
            let idx = self.add_const(val);
            return self.push_operand(OpCode::LoadConst(idx));
        }

        Err(ExpressionError::UnknownIdentifier {
            name,
            available: self.params.join(", "),
        })
    }
}
