use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};
use crate::parser::ast::{
    BinOp, ClassDef, CmpOp, Expr, ExprKind, FunctionDef, Module, Param, Stmt, StmtKind, UnaryOp,
};

/// Recursive-descent parser over the scanner's token stream.
///
/// Statement structure follows the Indent/Dedent tokens; expressions use one
/// level per precedence tier, mirroring the C-side levels the IR renders
/// with. Constructs outside the restricted grammar fail here when they
/// cannot even be tokenized into a known statement shape; the rest (e.g.
/// non-`range` for loops) fail later in the translator where a better
/// diagnostic is possible.
pub struct SourceParser {
    tokens: Vec<Token>,
    current: usize,
}

impl SourceParser {
    /// Creates a parser over the given tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        SourceParser { tokens, current: 0 }
    }

    /// Parses the tokens into a module
    pub fn parse(&mut self) -> Result<Module> {
        let mut body = Vec::new();
        self.skip_newlines();
        while !self.is_at_end() {
            body.push(self.parse_statement()?);
            self.skip_newlines();
        }
        Ok(Module { body })
    }

    // ============= statements =============

    fn parse_statement(&mut self) -> Result<Stmt> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::At | TokenKind::Def => self.parse_function_def(),
            TokenKind::Class => self.parse_class_def(),
            TokenKind::If | TokenKind::Elif => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Pass => self.parse_terminal(StmtKind::Pass),
            TokenKind::Break => self.parse_terminal(StmtKind::Break),
            TokenKind::Continue => self.parse_terminal(StmtKind::Continue),
            TokenKind::Import | TokenKind::From => self.parse_import(),
            _ => self.parse_simple_statement(),
        }
    }

    fn parse_function_def(&mut self) -> Result<Stmt> {
        let mut decorators = Vec::new();
        while self.check(&TokenKind::At) {
            self.advance();
            decorators.push(self.expect_name()?);
            self.consume(TokenKind::Newline, "newline after decorator")?;
            self.skip_newlines();
        }
        let def = self.consume(TokenKind::Def, "`def`")?;
        let name = self.expect_name()?;
        self.consume(TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let ptok = self.peek().clone();
            let pname = self.expect_name()?;
            let annotation = if self.match_kind(&TokenKind::Colon) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            args.push(Param {
                name: pname,
                annotation,
                line: ptok.line,
                col: ptok.column,
            });
            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RParen, "`)`")?;
        let returns = if self.match_kind(&TokenKind::Arrow) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        Ok(Stmt::new(
            StmtKind::FunctionDef(FunctionDef {
                name,
                args,
                returns,
                body,
                decorators,
            }),
            def.line,
            def.column,
        ))
    }

    fn parse_class_def(&mut self) -> Result<Stmt> {
        let class = self.consume(TokenKind::Class, "`class`")?;
        let name = self.expect_name()?;
        if self.match_kind(&TokenKind::LParen) {
            // Base classes are outside the restricted grammar; only the
            // empty `class C():` spelling is tolerated.
            self.consume(TokenKind::RParen, "`)`")?;
        }
        let body = self.parse_block()?;
        Ok(Stmt::new(
            StmtKind::ClassDef(ClassDef { name, body }),
            class.line,
            class.column,
        ))
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        // `elif` re-enters here and behaves exactly like a fresh `if`
        let tok = self.advance();
        let test = self.parse_expression()?;
        let body = self.parse_block()?;
        let orelse = if self.check(&TokenKind::Elif) {
            vec![self.parse_if()?]
        } else if self.match_kind(&TokenKind::Else) {
            self.parse_block()?
        } else {
            Vec::new()
        };
        Ok(Stmt::new(
            StmtKind::If { test, body, orelse },
            tok.line,
            tok.column,
        ))
    }

    fn parse_while(&mut self) -> Result<Stmt> {
        let tok = self.advance();
        let test = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Stmt::new(StmtKind::While { test, body }, tok.line, tok.column))
    }

    fn parse_for(&mut self) -> Result<Stmt> {
        let tok = self.advance();
        let target = self.parse_postfix()?;
        self.consume(TokenKind::In, "`in`")?;
        let iter = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Stmt::new(
            StmtKind::For { target, iter, body },
            tok.line,
            tok.column,
        ))
    }

    fn parse_return(&mut self) -> Result<Stmt> {
        let tok = self.advance();
        let value = if self.check(&TokenKind::Newline) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Newline, "newline")?;
        Ok(Stmt::new(StmtKind::Return { value }, tok.line, tok.column))
    }

    fn parse_terminal(&mut self, kind: StmtKind) -> Result<Stmt> {
        let tok = self.advance();
        self.consume(TokenKind::Newline, "newline")?;
        Ok(Stmt::new(kind, tok.line, tok.column))
    }

    fn parse_import(&mut self) -> Result<Stmt> {
        let tok = self.advance();
        let mut names = Vec::new();
        while !self.check(&TokenKind::Newline) && !self.is_at_end() {
            let t = self.advance();
            if let TokenKind::Name(name) = t.kind {
                names.push(name);
            }
        }
        self.consume(TokenKind::Newline, "newline")?;
        Ok(Stmt::new(StmtKind::Import { names }, tok.line, tok.column))
    }

    fn parse_simple_statement(&mut self) -> Result<Stmt> {
        let (line, col) = (self.peek().line, self.peek().column);
        let first = self.parse_expression()?;
        let kind = if self.match_kind(&TokenKind::Colon) {
            let annotation = self.parse_expression()?;
            let value = if self.match_kind(&TokenKind::Assign) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            StmtKind::AnnAssign {
                target: first,
                annotation,
                value,
            }
        } else if self.check(&TokenKind::Assign) {
            let mut exprs = vec![first];
            while self.match_kind(&TokenKind::Assign) {
                exprs.push(self.parse_expression()?);
            }
            let value = exprs.pop().expect("at least the first expression");
            StmtKind::Assign {
                targets: exprs,
                value,
            }
        } else if let Some(op) = Self::aug_op(&self.peek().kind) {
            self.advance();
            let value = self.parse_expression()?;
            StmtKind::AugAssign {
                target: first,
                op,
                value,
            }
        } else {
            StmtKind::ExprStmt { value: first }
        };
        self.consume(TokenKind::Newline, "newline")?;
        Ok(Stmt::new(kind, line, col))
    }

    fn aug_op(kind: &TokenKind) -> Option<BinOp> {
        match kind {
            TokenKind::PlusAssign => Some(BinOp::Add),
            TokenKind::MinusAssign => Some(BinOp::Sub),
            TokenKind::StarAssign => Some(BinOp::Mul),
            TokenKind::SlashAssign => Some(BinOp::Div),
            TokenKind::PercentAssign => Some(BinOp::Mod),
            TokenKind::LShiftAssign => Some(BinOp::LShift),
            TokenKind::RShiftAssign => Some(BinOp::RShift),
            TokenKind::AmpAssign => Some(BinOp::BitAnd),
            TokenKind::CaretAssign => Some(BinOp::BitXor),
            TokenKind::PipeAssign => Some(BinOp::BitOr),
            _ => None,
        }
    }

    /// Parses `:` NEWLINE INDENT statements DEDENT
    fn parse_block(&mut self) -> Result<Vec<Stmt>> {
        self.consume(TokenKind::Colon, "`:`")?;
        self.consume(TokenKind::Newline, "newline")?;
        self.consume(TokenKind::Indent, "an indented block")?;
        let mut body = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            body.push(self.parse_statement()?);
            self.skip_newlines();
        }
        self.consume(TokenKind::Dedent, "end of block")?;
        Ok(body)
    }

    // ============= expressions =============

    fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_ifexp()
    }

    fn parse_ifexp(&mut self) -> Result<Expr> {
        let body = self.parse_or()?;
        if self.match_kind(&TokenKind::If) {
            let test = self.parse_or()?;
            self.consume(TokenKind::Else, "`else`")?;
            let orelse = self.parse_ifexp()?;
            let (line, col) = (body.line, body.col);
            return Ok(Expr::new(
                ExprKind::IfExp {
                    test: Box::new(test),
                    body: Box::new(body),
                    orelse: Box::new(orelse),
                },
                line,
                col,
            ));
        }
        Ok(body)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.match_kind(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = Self::binop(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        while self.match_kind(&TokenKind::And) {
            let right = self.parse_not()?;
            left = Self::binop(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.check(&TokenKind::Not) {
            let tok = self.advance();
            let operand = self.parse_not()?;
            return Ok(Expr::new(
                ExprKind::UnaryOp {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                tok.line,
                tok.column,
            ));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_bitor()?;
        let op = match self.peek().kind {
            TokenKind::EqEq => Some(CmpOp::Eq),
            TokenKind::NotEq => Some(CmpOp::NotEq),
            TokenKind::Lt => Some(CmpOp::Lt),
            TokenKind::LtEq => Some(CmpOp::LtEq),
            TokenKind::Gt => Some(CmpOp::Gt),
            TokenKind::GtEq => Some(CmpOp::GtEq),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let right = self.parse_bitor()?;
            let (line, col) = (left.line, left.col);
            return Ok(Expr::new(
                ExprKind::Compare {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
                col,
            ));
        }
        Ok(left)
    }

    fn parse_bitor(&mut self) -> Result<Expr> {
        let mut left = self.parse_bitxor()?;
        while self.match_kind(&TokenKind::Pipe) {
            let right = self.parse_bitxor()?;
            left = Self::binop(BinOp::BitOr, left, right);
        }
        Ok(left)
    }

    fn parse_bitxor(&mut self) -> Result<Expr> {
        let mut left = self.parse_bitand()?;
        while self.match_kind(&TokenKind::Caret) {
            let right = self.parse_bitand()?;
            left = Self::binop(BinOp::BitXor, left, right);
        }
        Ok(left)
    }

    fn parse_bitand(&mut self) -> Result<Expr> {
        let mut left = self.parse_shift()?;
        while self.match_kind(&TokenKind::Amp) {
            let right = self.parse_shift()?;
            left = Self::binop(BinOp::BitAnd, left, right);
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> Result<Expr> {
        let mut left = self.parse_arith()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::LShift => BinOp::LShift,
                TokenKind::RShift => BinOp::RShift,
                _ => break,
            };
            self.advance();
            let right = self.parse_arith()?;
            left = Self::binop(op, left, right);
        }
        Ok(left)
    }

    fn parse_arith(&mut self) -> Result<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Self::binop(op, left, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Self::binop(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek().kind {
            TokenKind::Plus => Some(UnaryOp::Pos),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Tilde => Some(UnaryOp::Invert),
            _ => None,
        };
        if let Some(op) = op {
            let tok = self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::new(
                ExprKind::UnaryOp {
                    op,
                    operand: Box::new(operand),
                },
                tok.line,
                tok.column,
            ));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.match_kind(&TokenKind::LParen) {
                expr = self.finish_call(expr)?;
            } else if self.match_kind(&TokenKind::Dot) {
                let attr = self.expect_name()?;
                let (line, col) = (expr.line, expr.col);
                expr = Expr::new(
                    ExprKind::Attribute {
                        value: Box::new(expr),
                        attr,
                    },
                    line,
                    col,
                );
            } else if self.match_kind(&TokenKind::LBracket) {
                expr = self.finish_subscript(expr)?;
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, func: Expr) -> Result<Expr> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let is_keyword = matches!(self.peek().kind, TokenKind::Name(_))
                && matches!(self.peek_next().map(|t| &t.kind), Some(TokenKind::Assign));
            if is_keyword {
                let name = self.expect_name()?;
                self.consume(TokenKind::Assign, "`=`")?;
                keywords.push((name, self.parse_expression()?));
            } else {
                args.push(self.parse_expression()?);
            }
            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RParen, "`)`")?;
        let (line, col) = (func.line, func.col);
        Ok(Expr::new(
            ExprKind::Call {
                func: Box::new(func),
                args,
                keywords,
            },
            line,
            col,
        ))
    }

    fn finish_subscript(&mut self, value: Expr) -> Result<Expr> {
        let mut items = Vec::new();
        loop {
            items.push(self.parse_slice_item()?);
            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
            if self.check(&TokenKind::RBracket) {
                break;
            }
        }
        self.consume(TokenKind::RBracket, "`]`")?;
        let (line, col) = (value.line, value.col);
        let index = if items.len() == 1 {
            items.pop().expect("one item")
        } else {
            let (il, ic) = (items[0].line, items[0].col);
            Expr::new(ExprKind::Tuple(items), il, ic)
        };
        Ok(Expr::new(
            ExprKind::Subscript {
                value: Box::new(value),
                index: Box::new(index),
            },
            line,
            col,
        ))
    }

    fn parse_slice_item(&mut self) -> Result<Expr> {
        let (line, col) = (self.peek().line, self.peek().column);
        let lower = if self.check(&TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        if self.match_kind(&TokenKind::Colon) {
            let at_end = |p: &Self| {
                p.check(&TokenKind::Comma) || p.check(&TokenKind::RBracket) || p.check(&TokenKind::Colon)
            };
            let upper = if at_end(self) {
                None
            } else {
                Some(Box::new(self.parse_expression()?))
            };
            let step = if self.match_kind(&TokenKind::Colon) {
                if self.check(&TokenKind::Comma) || self.check(&TokenKind::RBracket) {
                    None
                } else {
                    Some(Box::new(self.parse_expression()?))
                }
            } else {
                None
            };
            return Ok(Expr::new(ExprKind::Slice { lower, upper, step }, line, col));
        }
        Ok(*lower.expect("non-slice item has an expression"))
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let tok = self.peek().clone();
        let kind = match tok.kind {
            TokenKind::Int(n) => {
                self.advance();
                ExprKind::Int(n)
            }
            TokenKind::Float(x) => {
                self.advance();
                ExprKind::Float(x)
            }
            TokenKind::Str(ref s) => {
                let s = s.clone();
                self.advance();
                ExprKind::Str(s)
            }
            TokenKind::True => {
                self.advance();
                ExprKind::Bool(true)
            }
            TokenKind::False => {
                self.advance();
                ExprKind::Bool(false)
            }
            TokenKind::NoneLit => {
                self.advance();
                ExprKind::NoneLit
            }
            TokenKind::Name(ref name) => {
                let name = name.clone();
                self.advance();
                ExprKind::Name(name)
            }
            TokenKind::LParen => {
                self.advance();
                let first = self.parse_expression()?;
                if self.match_kind(&TokenKind::Comma) {
                    let mut items = vec![first];
                    while !self.check(&TokenKind::RParen) {
                        items.push(self.parse_expression()?);
                        if !self.match_kind(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.consume(TokenKind::RParen, "`)`")?;
                    ExprKind::Tuple(items)
                } else {
                    self.consume(TokenKind::RParen, "`)`")?;
                    return Ok(first);
                }
            }
            _ => {
                return Err(self.syntax_error(format!(
                    "expected an expression, got {}",
                    tok.kind
                )));
            }
        };
        Ok(Expr::new(kind, tok.line, tok.column))
    }

    // ============= helpers =============

    fn binop(op: BinOp, left: Expr, right: Expr) -> Expr {
        let (line, col) = (left.line, left.col);
        Expr::new(
            ExprKind::BinOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            line,
            col,
        )
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn expect_name(&mut self) -> Result<String> {
        match self.peek().kind.clone() {
            TokenKind::Name(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(Error::UnexpectedToken {
                expected: "an identifier".to_string(),
                got: other.to_string(),
                line: self.peek().line,
            }),
        }
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(Error::UnexpectedToken {
                expected: expected.to_string(),
                got: self.peek().kind.to_string(),
                line: self.peek().line,
            })
        }
    }

    fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> Option<&Token> {
        self.tokens.get(self.current + 1)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.current < self.tokens.len() - 1 {
            self.current += 1;
        }
        tok
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn syntax_error(&self, message: String) -> Error {
        Error::syntax(self.peek().line, self.peek().column, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;

    fn parse(source: &str) -> Module {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        SourceParser::new(tokens).parse().unwrap()
    }

    #[test]
    fn test_parse_function_def() {
        let module = parse("def f(n: int) -> int:\n    return n * 2\n");
        assert_eq!(module.body.len(), 1);
        match &module.body[0].kind {
            StmtKind::FunctionDef(def) => {
                assert_eq!(def.name, "f");
                assert_eq!(def.args.len(), 1);
                assert!(def.args[0].annotation.is_some());
                assert!(def.returns.is_some());
            }
            other => panic!("expected function def, got {:?}", other),
        }
    }

    #[test]
    fn test_elif_nests_inside_orelse() {
        let module = parse("if x < 0:\n    pass\nelif x < 5:\n    pass\nelse:\n    pass\n");
        match &module.body[0].kind {
            StmtKind::If { orelse, .. } => {
                assert_eq!(orelse.len(), 1);
                match &orelse[0].kind {
                    StmtKind::If { orelse: inner, .. } => assert_eq!(inner.len(), 1),
                    other => panic!("expected nested if, got {:?}", other),
                }
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_array_annotation_subscript() {
        let module = parse("def f(arr: Double[:, 2]) -> Double:\n    return arr[0, 0]\n");
        match &module.body[0].kind {
            StmtKind::FunctionDef(def) => {
                let ann = def.args[0].annotation.as_ref().unwrap();
                match &ann.kind {
                    ExprKind::Subscript { index, .. } => match &index.kind {
                        ExprKind::Tuple(items) => {
                            assert!(matches!(items[0].kind, ExprKind::Slice { .. }));
                            assert!(matches!(items[1].kind, ExprKind::Int(2)));
                        }
                        other => panic!("expected tuple index, got {:?}", other),
                    },
                    other => panic!("expected subscript annotation, got {:?}", other),
                }
            }
            other => panic!("expected function def, got {:?}", other),
        }
    }

    #[test]
    fn test_chained_assignment_collects_targets() {
        let module = parse("a = b = 1\n");
        match &module.body[0].kind {
            StmtKind::Assign { targets, .. } => assert_eq!(targets.len(), 2),
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_aug_assign() {
        let module = parse("s += i\n");
        assert!(matches!(
            module.body[0].kind,
            StmtKind::AugAssign { op: BinOp::Add, .. }
        ));
    }

    #[test]
    fn test_ternary_expression() {
        let module = parse("x = 1 if n % 2 == 0 else 0\n");
        match &module.body[0].kind {
            StmtKind::Assign { value, .. } => {
                assert!(matches!(value.kind, ExprKind::IfExp { .. }))
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_call_keywords() {
        let module = parse("f(1, mode=2)\n");
        match &module.body[0].kind {
            StmtKind::ExprStmt { value } => match &value.kind {
                ExprKind::Call { args, keywords, .. } => {
                    assert_eq!(args.len(), 1);
                    assert_eq!(keywords.len(), 1);
                    assert_eq!(keywords[0].0, "mode");
                }
                other => panic!("expected call, got {:?}", other),
            },
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_decorated_method() {
        let module = parse("@staticmethod\ndef f(x: int) -> int:\n    return x\n");
        match &module.body[0].kind {
            StmtKind::FunctionDef(def) => assert_eq!(def.decorators, vec!["staticmethod"]),
            other => panic!("expected function def, got {:?}", other),
        }
    }

    #[test]
    fn test_annotated_assignment_with_const_marker() {
        let module = parse("n: \"const\" = 10\n");
        match &module.body[0].kind {
            StmtKind::AnnAssign {
                annotation, value, ..
            } => {
                assert!(matches!(annotation.kind, ExprKind::Str(_)));
                assert!(value.is_some());
            }
            other => panic!("expected annotated assignment, got {:?}", other),
        }
    }
}
