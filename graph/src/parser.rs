#![allow(clippy::redundant_closure_call)]

use crate::error::Error;
use crate::placement::PlacementTag;
use crate::signature::Field;
use ops::{PrimOp, ScalarType, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Decl,
    Fun,
    If,
    Else,
    True,
    False,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Arrow,
    Plus,
    Minus,
    Star,
    Colon,
    SemiColon,
    Comma,
    Equal,
    Lt,
    Gt,
    And,
    Pipe,
    Bang,
    At,
    Ident(String),
    Int(String),
    Float(String),
    Str(String),
}

#[derive(Debug, Clone)]
pub struct PosToken {
    pub t: Token,
    pub begin: usize,
    pub end: usize,
}

peg::parser! { grammar tokenizer() for str {
    pub rule tokenize() -> Vec<PosToken> = (ws() / comment())* t:token()* { t }

    rule ws()
        = quiet!{[' '|'\t'|'\n'|'\r']+}

    rule comment()
        = quiet!{ "//" [^'\n']* ("\n" / ![_])}

    rule token() -> PosToken
        = begin:position!() tok:(
            decl() / fun() / if_() / else_() / boolean() / paren() / arrow() /
            plus() / minus() / star() / colon() / semicolon() / comma() /
            equal() / lt() / gt() / and() / pipe() / bang() / at() /
            string() / ident() / number()
          ) end:position!()
          (ws() / comment())*
          { PosToken { t: tok, begin, end } }

    rule decl() -> Token = "decl" !alnum_() { Token::Decl }
    rule fun() -> Token = "fn" !alnum_() { Token::Fun }
    rule if_() -> Token = "if" !alnum_() { Token::If }
    rule else_() -> Token = "else" !alnum_() { Token::Else }
    rule boolean() -> Token
        = "true" !alnum_() { Token::True } / "false" !alnum_() { Token::False }
    rule paren() -> Token
        = "(" { Token::LParen }
        / ")" { Token::RParen }
        / "{" { Token::LBrace }
        / "}" { Token::RBrace }
    rule arrow() -> Token = "->" { Token::Arrow }
    rule plus() -> Token = "+" { Token::Plus }
    rule minus() -> Token = "-" { Token::Minus }
    rule star() -> Token = "*" { Token::Star }
    rule colon() -> Token = ":" { Token::Colon }
    rule semicolon() -> Token = ";" { Token::SemiColon }
    rule comma() -> Token = "," { Token::Comma }
    rule equal() -> Token = "=" { Token::Equal }
    rule lt() -> Token = "<" { Token::Lt }
    rule gt() -> Token = ">" { Token::Gt }
    rule and() -> Token = "&" { Token::And }
    rule pipe() -> Token = "|" { Token::Pipe }
    rule bang() -> Token = "!" { Token::Bang }
    rule at() -> Token = "@" { Token::At }

    rule alnum_() = quiet!{['a'..='z'|'A'..='Z'|'0'..='9'|'_']}

    rule string() -> Token
        = "\"" s:$([^'"'|'\n']*) "\"" { Token::Str(s.to_owned()) }

    rule ident() -> Token
        = ident: quiet!{$(['a'..='z'|'A'..='Z'|'_'] alnum_()*)}
        { Token::Ident(ident.to_string()) }
        / expected!("ident")

    rule number() -> Token
        = n: quiet!{$(['0'..='9']+ "." ['0'..='9']+)} { Token::Float(n.to_owned()) }
        / n: quiet!{$(['1'..='9']['0'..='9']* / ['0'])} { Token::Int(n.to_owned()) }
        / expected!("number")
} }

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedExpr {
    Literal(Value),
    Var(String),
    Call {
        name: String,
        args: Vec<ParsedExpr>,
    },
    Prim {
        op: PrimOp,
        operands: Vec<ParsedExpr>,
    },
    If {
        cond: Box<ParsedExpr>,
        then_expr: Box<ParsedExpr>,
        else_expr: Box<ParsedExpr>,
    },
    Placed {
        expr: Box<ParsedExpr>,
        tag: PlacementTag,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Decl {
        name: String,
        params: Vec<Field>,
        returns: Vec<Field>,
    },
    Func {
        name: String,
        params: Vec<Field>,
        returns: Vec<Field>,
        body: ParsedExpr,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<Item>,
}

fn binary(op: PrimOp, l: ParsedExpr, r: ParsedExpr) -> ParsedExpr {
    ParsedExpr::Prim {
        op,
        operands: vec![l, r],
    }
}

fn unary(op: PrimOp, e: ParsedExpr) -> ParsedExpr {
    ParsedExpr::Prim {
        op,
        operands: vec![e],
    }
}

peg::parser! { pub grammar parser() for [Token] {
    use Token::*;

    // type

    rule ty() -> ScalarType
        = [Ident(ty)] {? ty.parse().or(Err("scalar type (i32, f32, bool)")) }

    rule field() -> Field
        = [Ident(name)] [Colon] ty:ty() { Field { name, ty } }

    rule returns() -> Vec<Field>
        = [Arrow] [LParen] fields:(field() ** [Comma]) [RParen] { fields }
        / [Arrow] ty:ty() { vec![Field { name: "ret".to_owned(), ty }] }

    // expression

    pub rule expr() -> ParsedExpr
        = precedence! {
            l:(@) [Pipe] [Pipe] r:@   { binary(PrimOp::LogicalOr, l, r) }
            --
            l:(@) [And] [And] r:@     { binary(PrimOp::LogicalAnd, l, r) }
            --
            l:(@) [Equal] [Equal] r:@ { binary(PrimOp::Equal, l, r) }
            l:(@) [Bang] [Equal]  r:@ { binary(PrimOp::NotEqual, l, r) }
            --
            l:(@) [Lt] [Equal] r:@    { binary(PrimOp::LessEqual, l, r) }
            l:(@) [Gt] [Equal] r:@    { binary(PrimOp::GreaterEqual, l, r) }
            l:(@) [Lt] r:@            { binary(PrimOp::Less, l, r) }
            l:(@) [Gt] r:@            { binary(PrimOp::Greater, l, r) }
            --
            l:(@) [Plus]  r:@         { binary(PrimOp::Add, l, r) }
            l:(@) [Minus] r:@         { binary(PrimOp::Subtract, l, r) }
            --
            l:(@) [Star]  r:@         { binary(PrimOp::Multiply, l, r) }
            --
            [Bang] e:@                { unary(PrimOp::LogicalNot, e) }
            [Minus] e:@               { unary(PrimOp::Negate, e) }
            --
            e:@ tag:placement() { ParsedExpr::Placed { expr: Box::new(e), tag } }
            --
            e:if_expr() { e }

            [Ident(name)] [LParen] args:(expr() ** [Comma]) [RParen]
            { ParsedExpr::Call { name, args } }

            e:literal() { e }
            [Ident(name)] { ParsedExpr::Var(name) }

            [LParen] e:expr() [RParen] { e }
        }

    rule placement() -> PlacementTag
        = [At] [Str(tag)] {? tag.parse().or(Err("placement tag")) }

    rule literal() -> ParsedExpr
        = [True]  { ParsedExpr::Literal(Value::Bool(true)) }
        / [False] { ParsedExpr::Literal(Value::Bool(false)) }
        / [Int(n)]
        {?
            let n = n.parse().or(Err("i32 literal: integer too large"))?;
            Ok(ParsedExpr::Literal(Value::Int32(n)))
        }
        / [Float(x)]
        {?
            let x = x.parse().or(Err("f32 literal"))?;
            Ok(ParsedExpr::Literal(Value::Float32(x)))
        }

    rule block() -> ParsedExpr
        = [LBrace] e:expr() [RBrace] { e }

    rule if_expr() -> ParsedExpr
        = [If] cond:expr() then_expr:block() [Else] else_expr:(block() / if_expr())
        {
            ParsedExpr::If {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            }
        }

    // items

    rule declaration() -> Item
        = [Decl] [Ident(name)]
            [LParen] params:(field() ** [Comma]) [RParen]
            returns:returns() [SemiColon]
        { Item::Decl { name, params, returns } }

    rule function_def() -> Item
        = [Fun] [Ident(name)]
            [LParen] params:(field() ** [Comma]) [RParen]
            returns:returns() body:block()
        { Item::Func { name, params, returns, body } }

    pub rule program() -> Program
        = items:(declaration() / function_def())* { Program { items } }
} }

fn line_column(text: &str, pos: usize) -> (usize, usize) {
    let before = &text[..pos];
    let line = before.as_bytes().iter().filter(|&&c| c == b'\n').count() + 1;
    let column = before.chars().rev().take_while(|&c| c != '\n').count() + 1;
    (line, column)
}

pub fn parse_program(text: &str) -> Result<Program, Error> {
    let pos_tokens: Vec<PosToken> = tokenizer::tokenize(text).map_err(|err| {
        let line = err.location.line;
        let column = err.location.column;
        let msg = "invalid token".to_owned();
        Error::Syntax { line, column, msg }
    })?;

    let (tokens, positions): (Vec<Token>, Vec<(usize, usize)>) = pos_tokens
        .into_iter()
        .map(|pt| (pt.t, (pt.begin, pt.end)))
        .unzip();

    parser::program(&tokens).map_err(|err| {
        let (pos, msg) = match tokens.get(err.location) {
            Some(tok) => (
                positions[err.location].0,
                format!("unexpected token {:?}, expected {}", tok, err.expected),
            ),
            None => (text.len(), format!("unexpected end of input, expected {}", err.expected)),
        };
        let (line, column) = line_column(text, pos);
        Error::Syntax { line, column, msg }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expr(text: &str) -> ParsedExpr {
        let source = format!("fn F() -> i32 {{ {} }}", text);
        match parse_program(&source).unwrap().items.remove(0) {
            Item::Func { body, .. } => body,
            item => panic!("unexpected item {:?}", item),
        }
    }

    fn int(x: i32) -> ParsedExpr {
        ParsedExpr::Literal(Value::Int32(x))
    }

    #[test]
    fn factorial_program() {
        let source = r#"
            // forward declaration
            decl Fac(n: i32) -> i32;

            fn Fac(n: i32) -> (ret: i32) {
                if n <= 1 { 1 } else { n * Fac(n - 1) }
            }
        "#;
        let program = parse_program(source).unwrap();
        assert_eq!(program.items.len(), 2);

        let n = || ParsedExpr::Var("n".into());
        let expect = Item::Func {
            name: "Fac".into(),
            params: vec![Field::new("n", ScalarType::Int32)],
            returns: vec![Field::new("ret", ScalarType::Int32)],
            body: ParsedExpr::If {
                cond: Box::new(binary(PrimOp::LessEqual, n(), int(1))),
                then_expr: Box::new(int(1)),
                else_expr: Box::new(binary(
                    PrimOp::Multiply,
                    n(),
                    ParsedExpr::Call {
                        name: "Fac".into(),
                        args: vec![binary(PrimOp::Subtract, n(), int(1))],
                    },
                )),
            },
        };
        assert_eq!(program.items[1], expect);
        assert_eq!(
            program.items[0],
            Item::Decl {
                name: "Fac".into(),
                params: vec![Field::new("n", ScalarType::Int32)],
                returns: vec![Field::new("ret", ScalarType::Int32)],
            }
        );
    }

    #[test]
    fn precedence() {
        assert_eq!(
            parse_expr("1 + 2 * 3"),
            binary(PrimOp::Add, int(1), binary(PrimOp::Multiply, int(2), int(3)))
        );
        assert_eq!(
            parse_expr("(1 + 2) * 3"),
            binary(PrimOp::Multiply, binary(PrimOp::Add, int(1), int(2)), int(3))
        );
        assert_eq!(
            parse_expr("1 - 2 - 3"),
            binary(PrimOp::Subtract, binary(PrimOp::Subtract, int(1), int(2)), int(3))
        );
        assert_eq!(
            parse_expr("-1 < 2 && true"),
            binary(
                PrimOp::LogicalAnd,
                binary(PrimOp::Less, unary(PrimOp::Negate, int(1)), int(2)),
                ParsedExpr::Literal(Value::Bool(true))
            )
        );
    }

    #[test]
    fn placement_postfix() {
        let e = parse_expr(r#"Fib(n - 1) @ "/job:local/task:1" + 2.5"#);
        let call = ParsedExpr::Call {
            name: "Fib".into(),
            args: vec![binary(PrimOp::Subtract, ParsedExpr::Var("n".into()), int(1))],
        };
        let placed = ParsedExpr::Placed {
            expr: Box::new(call),
            tag: PlacementTag::job("local").with_task(1),
        };
        assert_eq!(
            e,
            binary(PrimOp::Add, placed, ParsedExpr::Literal(Value::Float32(2.5)))
        );
    }

    #[test]
    fn else_if_chain() {
        let e = parse_expr("if a { 1 } else if b { 2 } else { 3 }");
        match e {
            ParsedExpr::If { else_expr, .. } => {
                assert!(matches!(*else_expr, ParsedExpr::If { .. }));
            }
            e => panic!("unexpected {:?}", e),
        }
    }

    #[test]
    fn syntax_errors() {
        let err = parse_program("fn F() -> i32 {\n  1 +\n}").unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 3, column: 1, .. }));

        let err = parse_program("fn F() -> u64 { 1 }").unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 1, .. }));

        let err = parse_program("decl F() -> i32").unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 1, column: 16, .. }));

        let err = parse_program("fn F() -> i32 { 1 $ 2 }").unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 1, .. }));
    }
}
