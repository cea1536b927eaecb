//! # Compiler
//!
//! A single-pass Pratt parser that drives the [`Scanner`](crate::scanner)
//! and emits bytecode directly into the top-level function's [`Chunk`] as it
//! goes — there is no intermediate AST.
//!
//! ## Dispatch
//!
//! [`parse_precedence`] is the heart of the parser: advance, run the
//! previous token's prefix rule, then keep running infix rules for as long
//! as the current token binds at least as tightly as the requested
//! precedence. [`get_rule`] is a `match` over [`TokenKind`] returning a
//! [`ParseRule`] of `{prefix, infix, precedence}` — a function-pointer
//! dispatch table expressed as a match rather than a literal indexed array,
//! since Rust has no designated-initializer array syntax.
//!
//! `let`, `if`, `do`, `print` are ordinary prefix rules reachable from
//! `parse_precedence` like any operator, dispatched by [`Compiler::statement`]
//! at `Assignment` precedence (the original driver's own top-level rung) so
//! they can nest inside each other (an `if`'s branches may themselves be
//! `print` or `do...end`). Their own rule precedence (`Declaration`/
//! `Statement`) only matters for the infix-loop threshold — being below
//! `Assignment`, none of the four can ever be mistaken for an infix
//! continuation of the statement `statement()` just finished, which matters
//! because the trailing `;` is optional (see below).
//!
//! ## Statement boundary (redesign)
//!
//! The reference compiler never emits a trailing `Pop` after a bare
//! expression statement and never consumes the `;` token at all — every
//! token sequence the worked examples use would fail to compile as written.
//! This crate resolves that gap the way any statement-oriented Pratt parser
//! does: [`Compiler::statement`] tracks whether the construct it just
//! compiled left a dangling value (a plain expression, `print` — which pops
//! its operand but pushes `Nil` in its place per spec.md §4.3 — or `if` all
//! do; a local `let` claims its slot permanently and a global `let`'s
//! `DefineGlobal` already consumes its operand; a `do...end` block balances
//! itself by popping its own locals) and emits one `Pop` when it did, then
//! consumes an optional trailing `;`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::chunk::OpCode;
use crate::scanner::{Scanner, Token, TokenKind};
use crate::table::Interner;
use crate::value::{ObjFunction, Value};

/// Precedence ladder, lowest to highest. `Declaration`/`Statement`/`Literal`
/// are pseudo-statement rungs below `Assignment` — see the module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None,
    Declaration,
    Statement,
    Literal,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    /// One rung higher — used to make binary operators left-associative by
    /// parsing their right operand at `self + 1`.
    fn next(self) -> Precedence {
        use Precedence::*;
        match self {
            None => Declaration,
            Declaration => Statement,
            Statement => Literal,
            Literal => Assignment,
            Assignment => Or,
            Or => And,
            And => Equality,
            Equality => Comparison,
            Comparison => Term,
            Term => Factor,
            Factor => Unary,
            Unary => Call,
            Call => Primary,
            Primary => Primary,
        }
    }
}

type ParseFn<'src> = fn(&mut Compiler<'src>, bool);

#[derive(Clone, Copy)]
struct ParseRule<'src> {
    prefix: Option<ParseFn<'src>>,
    infix: Option<ParseFn<'src>>,
    precedence: Precedence,
}

fn get_rule<'src>(kind: TokenKind) -> ParseRule<'src> {
    use TokenKind::*;
    let (prefix, infix, precedence): (Option<ParseFn<'src>>, Option<ParseFn<'src>>, Precedence) =
        match kind {
            LeftParen => (Some(Compiler::grouping), None, Precedence::None),
            Minus => (
                Some(Compiler::unary),
                Some(Compiler::binary),
                Precedence::Term,
            ),
            Plus => (None, Some(Compiler::binary), Precedence::Term),
            Slash | Star => (None, Some(Compiler::binary), Precedence::Factor),
            Bang => (Some(Compiler::unary), None, Precedence::None),
            BangEqual | EqualEqual => (None, Some(Compiler::binary), Precedence::Equality),
            Greater | GreaterEqual | Less | LessEqual => {
                (None, Some(Compiler::binary), Precedence::Comparison)
            }
            Number => (Some(Compiler::number), None, Precedence::None),
            String => (Some(Compiler::string), None, Precedence::None),
            Identifier => (Some(Compiler::variable), None, Precedence::None),
            True | False | Nil => (Some(Compiler::literal), None, Precedence::None),
            And => (None, Some(Compiler::and_), Precedence::And),
            Or => (None, Some(Compiler::or_), Precedence::Or),
            Let => (
                Some(Compiler::let_declaration),
                None,
                Precedence::Declaration,
            ),
            If => (Some(Compiler::if_expression), None, Precedence::Statement),
            Do => (Some(Compiler::block_expression), None, Precedence::Statement),
            Print => (Some(Compiler::print_statement), None, Precedence::Statement),
            _ => (None, None, Precedence::None),
        };
    ParseRule {
        prefix,
        infix,
        precedence,
    }
}

/// A compile-time record of a local variable's name and the scope depth at
/// which it became initialized. `depth == -1` means "declared but its
/// initializer hasn't finished compiling yet" (used to reject self-reference
/// in `let x = x`).
struct Local<'src> {
    name: Token<'src>,
    depth: i32,
}

const MAX_LOCALS: usize = 256;

pub struct Compiler<'src> {
    scanner: Scanner<'src>,
    previous: Token<'src>,
    current: Token<'src>,
    had_error: bool,
    panic_mode: bool,
    locals: Vec<Local<'src>>,
    scope_depth: i32,
    function: ObjFunction,
    interner: Rc<RefCell<Interner>>,
    /// Set by whichever construct `statement()` most recently dispatched;
    /// tells `statement()` whether to emit a trailing `Pop`.
    yields_value: bool,
}

impl<'src> Compiler<'src> {
    fn new(source: &'src str, interner: Rc<RefCell<Interner>>) -> Self {
        let placeholder = Token {
            kind: TokenKind::Eof,
            lexeme: "",
            line: 0,
        };
        // Slot 0 of the runtime stack always holds the running function
        // itself (see `Vm::interpret`/`Vm::call`); reserving a nameless
        // local here keeps compile-time local indices in lockstep with
        // that layout without the VM needing to special-case slot 0.
        let reserved_slot = Local {
            name: placeholder,
            depth: 0,
        };
        Compiler {
            scanner: Scanner::new(source),
            previous: placeholder,
            current: placeholder,
            had_error: false,
            panic_mode: false,
            locals: vec![reserved_slot],
            scope_depth: 0,
            function: ObjFunction::new(None),
            interner,
            yields_value: true,
        }
    }

    // --- Token stream plumbing ------------------------------------------

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            self.error_at_current(self.current.lexeme);
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    // --- Diagnostics ------------------------------------------------------

    fn error_at_current(&mut self, message: &str) {
        self.error_at(self.current, message);
    }

    fn error(&mut self, message: &str) {
        self.error_at(self.previous, message);
    }

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        eprint!("[line {}] Error", token.line);
        match token.kind {
            TokenKind::Eof => eprint!(" at end"),
            TokenKind::Error => {}
            _ => eprint!(" at '{}'", token.lexeme),
        }
        eprintln!(": {message}");
        self.had_error = true;
    }

    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            match self.current.kind {
                TokenKind::Let
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {}
            }
            self.advance();
        }
    }

    // --- Bytecode emission -------------------------------------------------

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line as i32;
        self.function.chunk.write(byte, line);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.emit_byte(op as u8);
    }

    fn emit_op_byte(&mut self, op: OpCode, byte: u8) {
        self.emit_op(op);
        self.emit_byte(byte);
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        let idx = self.function.chunk.add_constant(value);
        if idx > u8::MAX as usize {
            self.error("Too many constants in one chunk.");
            return 0;
        }
        idx as u8
    }

    fn emit_constant(&mut self, value: Value) {
        let idx = self.make_constant(value);
        self.emit_op_byte(OpCode::Constant, idx);
    }

    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_op(op);
        self.emit_byte(0xff);
        self.emit_byte(0xff);
        self.function.chunk.code.len() - 2
    }

    fn patch_jump(&mut self, offset: usize) {
        let jump = self.function.chunk.code.len() - offset - 2;
        if jump > u16::MAX as usize {
            self.error("Too much code to jump over.");
        }
        let bytes = (jump as u16).to_be_bytes();
        self.function.chunk.code[offset] = bytes[0];
        self.function.chunk.code[offset + 1] = bytes[1];
    }

    fn emit_return(&mut self) {
        self.emit_op(OpCode::Nil);
        self.emit_op(OpCode::Return);
    }

    // --- Scopes & locals ----------------------------------------------------

    fn begin_scope(&mut self) {
        self.scope_depth += 1;
    }

    fn end_scope(&mut self) {
        self.scope_depth -= 1;
        while let Some(local) = self.locals.last() {
            if local.depth <= self.scope_depth {
                break;
            }
            self.emit_op(OpCode::Pop);
            self.locals.pop();
        }
    }

    fn add_local(&mut self, name: Token<'src>) {
        if self.locals.len() >= MAX_LOCALS {
            self.error("Too many local variables in function.");
            return;
        }
        self.locals.push(Local { name, depth: -1 });
    }

    fn declare_variable(&mut self) {
        if self.scope_depth == 0 {
            return;
        }
        let name = self.previous;
        for local in self.locals.iter().rev() {
            if local.depth != -1 && local.depth < self.scope_depth {
                break;
            }
            if local.name.lexeme == name.lexeme {
                self.error("Already a variable with this name in this scope.");
            }
        }
        self.add_local(name);
    }

    fn resolve_local(&mut self, name: Token<'src>) -> Option<u8> {
        for (i, local) in self.locals.iter().enumerate().rev() {
            if local.name.lexeme == name.lexeme {
                if local.depth == -1 {
                    self.error("Can't read local variable in its own initializer.");
                }
                return Some(i as u8);
            }
        }
        None
    }

    fn identifier_constant(&mut self, name: Token<'src>) -> u8 {
        let interned = self.interner.borrow_mut().intern(name.lexeme.to_string());
        self.make_constant(Value::string(interned))
    }

    fn parse_variable(&mut self, message: &str) -> u8 {
        self.consume(TokenKind::Identifier, message);
        self.declare_variable();
        if self.scope_depth > 0 {
            return 0;
        }
        self.identifier_constant(self.previous)
    }

    fn mark_initialized(&mut self) {
        if self.scope_depth == 0 {
            return;
        }
        let depth = self.scope_depth;
        self.locals.last_mut().expect("a local was just declared").depth = depth;
    }

    fn define_variable(&mut self, global: u8) {
        if self.scope_depth > 0 {
            self.mark_initialized();
            return;
        }
        self.emit_op_byte(OpCode::DefineGlobal, global);
    }

    // --- Expressions ---------------------------------------------------------

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let prefix = get_rule(self.previous.kind).prefix;
        let prefix = match prefix {
            Some(f) => f,
            None => {
                self.error("Expect expression.");
                return;
            }
        };
        let can_assign = precedence <= Precedence::Assignment;
        prefix(self, can_assign);

        while precedence <= get_rule(self.current.kind).precedence {
            self.advance();
            let infix = get_rule(self.previous.kind)
                .infix
                .expect("precedence table only routes here for infix-bearing tokens");
            infix(self, can_assign);
        }

        if can_assign && self.match_token(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    fn number(&mut self, _can_assign: bool) {
        let value: f64 = self
            .previous
            .lexeme
            .parse()
            .expect("scanner only produces well-formed number lexemes");
        self.emit_constant(Value::Number(value));
    }

    fn string(&mut self, _can_assign: bool) {
        let lexeme = self.previous.lexeme;
        let content = &lexeme[1..lexeme.len() - 1];
        let interned = self.interner.borrow_mut().intern(content.to_string());
        self.emit_constant(Value::string(interned));
    }

    fn literal(&mut self, _can_assign: bool) {
        match self.previous.kind {
            TokenKind::True => self.emit_op(OpCode::True),
            TokenKind::False => self.emit_op(OpCode::False),
            TokenKind::Nil => self.emit_op(OpCode::Nil),
            _ => unreachable!("get_rule only routes literal tokens here"),
        }
    }

    fn grouping(&mut self, _can_assign: bool) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn unary(&mut self, _can_assign: bool) {
        let op_kind = self.previous.kind;
        self.parse_precedence(Precedence::Unary);
        match op_kind {
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            TokenKind::Bang => self.emit_op(OpCode::Not),
            _ => unreachable!("get_rule only routes unary tokens here"),
        }
    }

    fn binary(&mut self, _can_assign: bool) {
        let op_kind = self.previous.kind;
        let rule = get_rule::<'src>(op_kind);
        self.parse_precedence(rule.precedence.next());
        match op_kind {
            TokenKind::Plus => self.emit_op(OpCode::Add),
            TokenKind::Minus => self.emit_op(OpCode::Sub),
            TokenKind::Star => self.emit_op(OpCode::Mul),
            TokenKind::Slash => self.emit_op(OpCode::Div),
            TokenKind::BangEqual => {
                self.emit_op(OpCode::Eq);
                self.emit_op(OpCode::Not);
            }
            TokenKind::EqualEqual => self.emit_op(OpCode::Eq),
            TokenKind::Greater => self.emit_op(OpCode::Greater),
            TokenKind::GreaterEqual => {
                self.emit_op(OpCode::Less);
                self.emit_op(OpCode::Not);
            }
            TokenKind::Less => self.emit_op(OpCode::Less),
            TokenKind::LessEqual => {
                self.emit_op(OpCode::Greater);
                self.emit_op(OpCode::Not);
            }
            _ => unreachable!("get_rule only routes binary-operator tokens here"),
        }
    }

    fn and_(&mut self, _can_assign: bool) {
        let end_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::And);
        self.patch_jump(end_jump);
    }

    fn or_(&mut self, _can_assign: bool) {
        let else_jump = self.emit_jump(OpCode::JumpIfFalse);
        let end_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(else_jump);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::Or);
        self.patch_jump(end_jump);
    }

    fn variable(&mut self, can_assign: bool) {
        self.named_variable(self.previous, can_assign);
    }

    fn named_variable(&mut self, name: Token<'src>, can_assign: bool) {
        let (get_op, set_op, arg) = match self.resolve_local(name) {
            Some(slot) => (OpCode::GetLocal, OpCode::SetLocal, slot),
            None => {
                let idx = self.identifier_constant(name);
                (OpCode::GetGlobal, OpCode::SetGlobal, idx)
            }
        };
        if can_assign && self.match_token(TokenKind::Equal) {
            self.expression();
            self.emit_op_byte(set_op, arg);
        } else {
            self.emit_op_byte(get_op, arg);
        }
    }

    // --- Statement-shaped constructs ----------------------------------------

    fn let_declaration(&mut self, _can_assign: bool) {
        let global = self.parse_variable("Expect variable name.");
        if self.match_token(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_op(OpCode::Nil);
        }
        self.define_variable(global);
        self.yields_value = false;
    }

    fn block_expression(&mut self, _can_assign: bool) {
        self.begin_scope();
        while !self.check(TokenKind::End) && !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume(TokenKind::End, "Expect 'end' after block.");
        self.end_scope();
        self.yields_value = false;
    }

    fn if_expression(&mut self, _can_assign: bool) {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let then_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.expression();

        let else_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(then_jump);
        self.emit_op(OpCode::Pop);

        if self.match_token(TokenKind::Else) {
            self.expression();
        } else {
            self.emit_op(OpCode::Nil);
        }
        self.patch_jump(else_jump);
        self.consume(TokenKind::End, "Expect 'end' after 'if'.");
        // Every construct reachable as a branch expression (including
        // `print`, which pushes `Nil` after printing) nets exactly one
        // stack value, so both branches leave the same depth regardless of
        // which one runs - `yields_value = true` is sound here.
        self.yields_value = true;
    }

    fn print_statement(&mut self, _can_assign: bool) {
        self.expression();
        self.emit_op(OpCode::Print);
        // OpPrint pops its operand to print it but pushes Nil in its place
        // (spec.md §4.3's opcode table), so like a bare expression statement
        // there's a dangling value left for `statement()` to pop.
        self.yields_value = true;
    }

    // --- Top-level driver -----------------------------------------------------

    fn statement(&mut self) {
        self.yields_value = true;
        // Entered at `Assignment`, matching the original driver's top-level
        // precedence (not `Declaration`/`Statement`, the pseudo-statement
        // rungs `let`/`if`/`do`/`print` sit at): those four rungs are below
        // `Assignment`, so the infix loop's `precedence <= get_rule(...).
        // precedence` test never admits them back in as a continuation when
        // the next statement happens to omit its leading `;`. Entering at
        // their own low precedence would let e.g. a `let`/`print` token
        // straight after one statement (no `;` between them) be mistaken
        // for an infix continuation, which none of them have.
        self.parse_precedence(Precedence::Assignment);
        if self.yields_value {
            self.emit_op(OpCode::Pop);
        }
        self.match_token(TokenKind::Semicolon);
    }

    fn declaration(&mut self) {
        self.statement();
        if self.panic_mode {
            self.synchronize();
        }
    }
}

/// Compile `source` into a top-level (anonymous) function, sharing `interner`
/// with whatever VM will run it so that string literals compiled here are
/// identity-equal to equal-content strings produced by earlier or later
/// compiles against the same VM (e.g. successive REPL lines).
///
/// Returns `None` if any compile error was reported; diagnostics are printed
/// to stderr as they're found (panic-mode recovery keeps parsing to surface
/// more than one error per call, but no bytecode is returned on failure).
pub fn compile(source: &str, interner: Rc<RefCell<Interner>>) -> Option<Rc<ObjFunction>> {
    let mut compiler = Compiler::new(source, interner);
    compiler.advance();
    while !compiler.check(TokenKind::Eof) {
        compiler.declaration();
    }
    compiler.consume(TokenKind::Eof, "Expect end of expression.");
    compiler.emit_return();

    if compiler.had_error {
        None
    } else {
        Some(Rc::new(compiler.function))
    }
}
