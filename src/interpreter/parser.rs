use std::fmt::{Display, Formatter};
use std::rc::Rc;
use crate::interpreter::ast::{BinOp, ClassDecl, Expr, FieldDecl, FuncDecl, Program, Stmt, UnaryOp};
use crate::interpreter::lexer::{LiteralValue, Token, TokenKind};
use crate::interpreter::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    Expected { what: &'static str, line: u32 },
    UnexpectedToken { token: String, line: u32 },
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Expected { what, line } => write!(f, "{} at line {}", what, line),
            ParseError::UnexpectedToken { token, line } => write!(f, "Unexpected token {} at line {}", token, line),
        }
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Parses a token sequence into a program AST.
pub fn parse(tokens: Vec<Token>) -> ParseResult<Program> {
    Parser::new(tokens).parse()
}

/// Recursive descent with one-token lookahead. The only backtracking is a
/// single rewind in `statement` to tell an assignment apart from a bare
/// expression statement.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> ParseResult<Program> {
        Ok(Program { statements: self.statement_list()? })
    }

    // Iterative rendition of `<statement-list> ::= <statement> <statement-list> | ε`;
    // ε corresponds to a closing brace or the end of input.
    fn statement_list(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.is_at_end() && !self.check(TokenKind::BraceRight) {
            if let Some(stmt) = self.statement()? {
                statements.push(stmt);
            }
        }

        Ok(statements)
    }

    fn statement(&mut self) -> ParseResult<Option<Stmt>> {
        if self.matches(TokenKind::Eof) {
            return Ok(None);
        }

        if self.matches(TokenKind::Var) {
            return self.var_declaration().map(Some);
        } else if self.matches(TokenKind::If) {
            return self.if_statement().map(Some);
        } else if self.matches(TokenKind::While) {
            return self.while_loop().map(Some);
        } else if self.matches(TokenKind::Func) {
            return self.func_definition().map(Some);
        } else if self.matches(TokenKind::Class) {
            return self.class_definition().map(Some);
        } else if self.matches(TokenKind::Return) {
            return self.return_statement().map(Some);
        }

        if self.check(TokenKind::Identifier) {
            let name = self.advance().name().to_owned();

            if self.matches(TokenKind::Assign) {
                let value = self.expression()?;
                self.expect(TokenKind::Semicolon, "Expected ';' after assignment statement")?;

                return Ok(Some(Stmt::Assignment { target: Expr::Variable(name), value }));
            }

            // Not an assignment: rewind past the identifier so the whole
            // expression parses in one piece
            self.current -= 1;

            let expr = self.expression()?;
            self.expect(TokenKind::Semicolon, "Expected ';' after expression statement")?;

            return Ok(Some(Stmt::Expression(expr)));
        }

        Err(self.unexpected_token())
    }

    // <var-declaration> ::= "var" <identifier> [ "=" <expression> ] ";"
    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.expect(TokenKind::Identifier, "Expected variable name after 'var'")?.name().to_owned();

        let initializer = if self.matches(TokenKind::Assign) {
            Some(self.expression()?)
        } else {
            None
        };

        self.expect(TokenKind::Semicolon, "Expected ';' after variable declaration")?;

        // No type annotation syntax exists; the tag is inferred from the
        // initial value when the declaration executes
        Ok(Stmt::VarDeclaration { name, declared_type: None, initializer })
    }

    // <if-statement> ::= "if" <expression> "{" <statement-list> "}" [ "else" "{" <statement-list> "}" ]
    fn if_statement(&mut self) -> ParseResult<Stmt> {
        let condition = self.expression()?;

        self.expect(TokenKind::BraceLeft, "Expected '{' after if condition")?;
        let then_branch = self.statement_list()?;
        self.expect(TokenKind::BraceRight, "Expected '}' after if block")?;

        let else_branch = if self.matches(TokenKind::Else) {
            self.expect(TokenKind::BraceLeft, "Expected '{' after else")?;
            let branch = self.statement_list()?;
            self.expect(TokenKind::BraceRight, "Expected '}' after else block")?;

            Some(branch)
        } else {
            None
        };

        Ok(Stmt::If { condition, then_branch, else_branch })
    }

    // <while-loop> ::= "while" <expression> "{" <statement-list> "}"
    fn while_loop(&mut self) -> ParseResult<Stmt> {
        let condition = self.expression()?;

        self.expect(TokenKind::BraceLeft, "Expected '{' after while condition")?;
        let body = self.statement_list()?;
        self.expect(TokenKind::BraceRight, "Expected '}' after while block")?;

        Ok(Stmt::While { condition, body })
    }

    // <function-definition> ::= "func" <identifier> "(" <parameter-list> ")" "{" <statement-list> "}"
    fn func_definition(&mut self) -> ParseResult<Stmt> {
        let name = self.expect(TokenKind::Identifier, "Expected function name after 'func'")?.name().to_owned();

        self.expect(TokenKind::ParenLeft, "Expected '(' after function name")?;
        let parameters = self.parameter_list()?;
        self.expect(TokenKind::ParenRight, "Expected ')' after parameters")?;

        self.expect(TokenKind::BraceLeft, "Expected '{' before function body")?;
        let body = self.statement_list()?;
        self.expect(TokenKind::BraceRight, "Expected '}' after function body")?;

        Ok(Stmt::FuncDefinition(Rc::new(FuncDecl { name, parameters, body })))
    }

    // <parameter-list> ::= <identifier> ("," <identifier>)* | ε
    fn parameter_list(&mut self) -> ParseResult<Vec<String>> {
        let mut parameters = Vec::new();

        if self.check(TokenKind::ParenRight) {
            return Ok(parameters);
        }

        loop {
            let name = self.expect(TokenKind::Identifier, "Expected parameter name")?.name().to_owned();
            parameters.push(name);

            if !self.matches(TokenKind::Comma) {
                return Ok(parameters);
            }
        }
    }

    // <class-definition> ::= "class" <identifier> "{" (<field-declaration>)* "}"
    fn class_definition(&mut self) -> ParseResult<Stmt> {
        let name = self.expect(TokenKind::Identifier, "Expected class name")?.name().to_owned();

        self.expect(TokenKind::BraceLeft, "Expected '{' after class name")?;
        let fields = self.field_list()?;
        self.expect(TokenKind::BraceRight, "Expected '}' after class body")?;

        Ok(Stmt::ClassDefinition(Rc::new(ClassDecl { name, fields })))
    }

    // <field-declaration> ::= "var" <identifier> [ "=" <expression> ] ";"
    fn field_list(&mut self) -> ParseResult<Vec<FieldDecl>> {
        let mut fields = Vec::new();

        while !self.check(TokenKind::BraceRight) && !self.is_at_end() {
            self.expect(TokenKind::Var, "Field declaration must start with 'var'")?;

            let name = self.expect(TokenKind::Identifier, "Expected field name")?.name().to_owned();

            let initializer = if self.matches(TokenKind::Assign) {
                Some(self.expression()?)
            } else {
                None
            };

            self.expect(TokenKind::Semicolon, "Expected ';' after field declaration")?;
            fields.push(FieldDecl { name, initializer });
        }

        Ok(fields)
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let expr = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };

        self.expect(TokenKind::Semicolon, "Expected ';' after return")?;
        Ok(Stmt::Return(expr))
    }

    // Expression parsing, lowest precedence first

    fn expression(&mut self) -> ParseResult<Expr> {
        self.logical_or()
    }

    // <logical-or> ::= <logical-and> ( "||" <logical-and> )*
    fn logical_or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.logical_and()?;

        while self.matches(TokenKind::Or) {
            let right = self.logical_and()?;
            expr = Expr::Binary { left: Box::new(expr), op: BinOp::Or, right: Box::new(right) };
        }

        Ok(expr)
    }

    // <logical-and> ::= <equality> ( "&&" <equality> )*
    fn logical_and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while self.matches(TokenKind::And) {
            let right = self.equality()?;
            expr = Expr::Binary { left: Box::new(expr), op: BinOp::And, right: Box::new(right) };
        }

        Ok(expr)
    }

    // <equality> ::= <comparison> ( ("==" | "!=") <comparison> )*
    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;

        loop {
            let op = if self.matches(TokenKind::Equal) {
                BinOp::Equal
            } else if self.matches(TokenKind::NotEqual) {
                BinOp::NotEqual
            } else {
                return Ok(expr);
            };

            let right = self.comparison()?;
            expr = Expr::Binary { left: Box::new(expr), op, right: Box::new(right) };
        }
    }

    // <comparison> ::= <add-sub> ( ("<" | ">" | "<=" | ">=") <add-sub> )*
    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.additive()?;

        loop {
            let op = if self.matches(TokenKind::Less) {
                BinOp::Less
            } else if self.matches(TokenKind::Greater) {
                BinOp::Greater
            } else if self.matches(TokenKind::LessEqual) {
                BinOp::LessEqual
            } else if self.matches(TokenKind::GreaterEqual) {
                BinOp::GreaterEqual
            } else {
                return Ok(expr);
            };

            let right = self.additive()?;
            expr = Expr::Binary { left: Box::new(expr), op, right: Box::new(right) };
        }
    }

    // <add-sub> ::= <mul-div> ( ("+" | "-") <mul-div> )*
    fn additive(&mut self) -> ParseResult<Expr> {
        let mut expr = self.multiplicative()?;

        loop {
            let op = if self.matches(TokenKind::Plus) {
                BinOp::Add
            } else if self.matches(TokenKind::Minus) {
                BinOp::Subtract
            } else {
                return Ok(expr);
            };

            let right = self.multiplicative()?;
            expr = Expr::Binary { left: Box::new(expr), op, right: Box::new(right) };
        }
    }

    // <mul-div> ::= <factor> ( ("*" | "/" | "%") <factor> )*
    fn multiplicative(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;

        loop {
            let op = if self.matches(TokenKind::Star) {
                BinOp::Multiply
            } else if self.matches(TokenKind::Slash) {
                BinOp::Divide
            } else if self.matches(TokenKind::Percent) {
                BinOp::Modulo
            } else {
                return Ok(expr);
            };

            let right = self.factor()?;
            expr = Expr::Binary { left: Box::new(expr), op, right: Box::new(right) };
        }
    }

    // <factor> ::= <literal> | <identifier> | <unary-expression>
    //            | "(" <expression> ")" | <function-call>
    fn factor(&mut self) -> ParseResult<Expr> {
        // Unary operators are right-associative: !!x parses as !(!x)
        if self.matches(TokenKind::Minus) {
            let operand = self.factor()?;
            return Ok(Expr::Unary { op: UnaryOp::Negate, operand: Box::new(operand) });
        } else if self.matches(TokenKind::Not) {
            let operand = self.factor()?;
            return Ok(Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand) });
        }

        if self.matches(TokenKind::ParenLeft) {
            let expr = self.expression()?;
            self.expect(TokenKind::ParenRight, "Expected ')' after expression")?;

            return Ok(expr);
        }

        // A call is an identifier directly followed by '('
        if self.check(TokenKind::Identifier) && self.peek_next().kind == TokenKind::ParenLeft {
            return self.func_call();
        }

        let token = self.advance().clone();

        match token.kind {
            TokenKind::Number | TokenKind::Text | TokenKind::True | TokenKind::False => {
                let value = match token.value {
                    Some(LiteralValue::Int(n)) => Value::Int(n),
                    Some(LiteralValue::Float(n)) => Value::Float(n),
                    Some(LiteralValue::Bool(b)) => Value::Bool(b),
                    Some(LiteralValue::Text(s)) => Value::Str(s),
                    None => return Err(ParseError::Expected { what: "Expected literal value", line: token.line }),
                };

                Ok(Expr::Literal(value))
            },
            TokenKind::Identifier => Ok(Expr::Variable(token.name().to_owned())),
            _ => Err(self.unexpected_token()),
        }
    }

    // <function-call> ::= <identifier> "(" <argument-list> ")"
    fn func_call(&mut self) -> ParseResult<Expr> {
        let name = self.expect(TokenKind::Identifier, "Expected function name")?.name().to_owned();

        self.expect(TokenKind::ParenLeft, "Expected '(' after function name")?;
        let args = self.argument_list()?;
        self.expect(TokenKind::ParenRight, "Expected ')' after arguments")?;

        Ok(Expr::FuncCall { name, args })
    }

    // <argument-list> ::= <expression> ("," <expression>)* | ε
    fn argument_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();

        if self.check(TokenKind::ParenRight) {
            return Ok(args);
        }

        loop {
            args.push(self.expression()?);

            if !self.matches(TokenKind::Comma) {
                return Ok(args);
            }
        }
    }

    // <class-instantiation> ::= <identifier> "{" [ <identifier> "=" <expression>
    //                           ("," <identifier> "=" <expression>)* ] "}"
    //
    // No grammar production refers to this rule yet, so instantiation
    // syntax is not reachable from program text.
    #[allow(unused)]
    fn class_instantiation(&mut self) -> ParseResult<Expr> {
        let name = self.expect(TokenKind::Identifier, "Expected class name")?.name().to_owned();

        self.expect(TokenKind::BraceLeft, "Expected '{' after class name")?;
        let mut initializers = Vec::new();

        if !self.check(TokenKind::BraceRight) {
            loop {
                let field = self.expect(TokenKind::Identifier, "Expected field name")?.name().to_owned();
                self.expect(TokenKind::Assign, "Expected '=' after field name")?;
                initializers.push((field, self.expression()?));

                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::BraceRight, "Expected '}' after class initializers")?;
        Ok(Expr::ClassExpr { name, initializers })
    }

    // Token cursor

    fn peek(&self) -> &Token {
        if self.is_at_end() {
            // The trailing Eof token
            &self.tokens[self.tokens.len() - 1]
        } else {
            &self.tokens[self.current]
        }
    }

    fn peek_next(&self) -> &Token {
        if self.current + 1 >= self.tokens.len() {
            &self.tokens[self.tokens.len() - 1]
        } else {
            &self.tokens[self.current + 1]
        }
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }

        self.advance();
        true
    }

    fn expect(&mut self, kind: TokenKind, what: &'static str) -> ParseResult<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::Expected { what, line: self.peek().line })
        }
    }

    fn unexpected_token(&self) -> ParseError {
        ParseError::UnexpectedToken { token: self.peek().to_string(), line: self.peek().line }
    }
}
