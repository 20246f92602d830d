//! Code generation: lower the parsed AST into Brainfuck.
//!
//! The emitter tracks a logical cursor – the cell the previously emitted
//! code leaves the tape pointer on – and translates every access into the
//! right number of pointer moves. All looping goes through `repeat_at`,
//! which emits the matching bracket pair around its body and pins both
//! brackets to the same cell, so the output is balanced on every code path.
//!
//! Tape layout: variable K (declaration order) lives in cell K, and a fixed
//! window of six temporaries sits directly above the variables. `t(0)` is
//! the accumulator: expression results, print staging and loop conditions
//! all land there.

use log::{debug, trace};

use crate::parser::{BinOp, CmpOp, Comparison, Expr, Program, Stmt};
use crate::symbols::SymbolTable;

/// Emit a Brainfuck program for a validated compilation unit.
pub fn generate(program: &Program) -> String {
  let mut emitter = Emitter::new(&program.symbols);
  for stmt in &program.stmts {
    emitter.stmt(stmt);
  }

  debug_assert_eq!(
    emitter.out.matches('[').count(),
    emitter.out.matches(']').count(),
    "emitted brackets must be balanced",
  );
  debug!(
    "emitted {} instructions for {} statements",
    emitter.out.len(),
    program.stmts.len()
  );
  emitter.out
}

struct Emitter<'a> {
  symbols: &'a SymbolTable,
  out: String,
  cursor: usize,
  base: usize,
}

impl<'a> Emitter<'a> {
  fn new(symbols: &'a SymbolTable) -> Self {
    Self {
      symbols,
      out: String::new(),
      cursor: 0,
      base: symbols.len(),
    }
  }

  /// Temporary cell `i` of the scratch window above the variables.
  fn t(&self, i: usize) -> usize {
    self.base + i
  }

  fn var_cell(&self, name: char) -> usize {
    self
      .symbols
      .cell(name)
      .expect("every reference is resolved during parsing")
  }

  /// Emit the pointer moves from the cursor to `cell`.
  fn move_to(&mut self, cell: usize) {
    if cell >= self.cursor {
      self.out.push_str(&">".repeat(cell - self.cursor));
    } else {
      self.out.push_str(&"<".repeat(self.cursor - cell));
    }
    self.cursor = cell;
  }

  fn inc(&mut self, n: usize) {
    self.out.push_str(&"+".repeat(n));
  }

  fn dec(&mut self, n: usize) {
    self.out.push_str(&"-".repeat(n));
  }

  /// Emit `[` body `]` looping on `cell`. The body may move the cursor
  /// freely; it is returned to `cell` before the closing bracket, keeping
  /// the runtime pointer and the bracket pair on the same cell.
  fn repeat_at(&mut self, cell: usize, body: impl FnOnce(&mut Self)) {
    self.move_to(cell);
    self.out.push('[');
    body(self);
    self.move_to(cell);
    self.out.push(']');
  }

  fn clear(&mut self, cell: usize) {
    self.repeat_at(cell, |e| e.dec(1));
  }

  fn set_literal(&mut self, cell: usize, value: u8) {
    self.clear(cell);
    self.inc(value as usize);
  }

  /// Copy `src` into `dst` without destroying `src`: drain the source into
  /// the destination and a scratch cell, then drain the scratch back.
  fn copy(&mut self, src: usize, dst: usize, scratch: usize) {
    debug_assert!(src != dst && src != scratch && dst != scratch);
    self.clear(dst);
    self.clear(scratch);
    self.repeat_at(src, |e| {
      e.dec(1);
      e.move_to(dst);
      e.inc(1);
      e.move_to(scratch);
      e.inc(1);
    });
    self.repeat_at(scratch, |e| {
      e.dec(1);
      e.move_to(src);
      e.inc(1);
    });
    self.move_to(dst);
  }

  /// Destructively move `src` into `dst`, leaving `src` zero.
  fn move_into(&mut self, src: usize, dst: usize) {
    debug_assert_ne!(src, dst);
    self.clear(dst);
    self.repeat_at(src, |e| {
      e.dec(1);
      e.move_to(dst);
      e.inc(1);
    });
  }

  /// Add (or subtract) one to `flag` if `cell` is non-zero, clearing `cell`.
  fn flag_nonzero(&mut self, cell: usize, flag: usize, up: bool) {
    self.repeat_at(cell, |e| {
      e.clear(cell);
      e.move_to(flag);
      if up {
        e.inc(1);
      } else {
        e.dec(1);
      }
    });
  }

  fn stmt(&mut self, stmt: &Stmt) {
    match stmt {
      Stmt::VarDecl { name, init } => {
        trace!("lowering declaration of '{name}'");
        self.store(*name, init);
      }
      Stmt::Assign { name, value } => {
        trace!("lowering assignment to '{name}'");
        self.store(*name, value);
      }
      Stmt::Print { value } => {
        self.expr(value, self.t(0));
        self.out.push('.');
      }
      Stmt::While { cond, body } => {
        trace!("lowering while on '{}'", cond.name);
        self.comparison(cond);
        let cell = self.t(0);
        self.repeat_at(cell, |e| {
          for stmt in body {
            e.stmt(stmt);
          }
          // The body may have changed the condition variable; the loop
          // construct only re-tests the current cell, so the condition
          // must be recomputed before the closing bracket.
          e.comparison(cond);
        });
      }
    }
  }

  /// Evaluate an expression into the accumulator, then move the result into
  /// the variable's cell. Going through the accumulator keeps the copy
  /// idiom's source intact, so `n = n - 1` reads the old value of `n`.
  fn store(&mut self, name: char, value: &Expr) {
    self.expr(value, self.t(0));
    self.move_into(self.t(0), self.var_cell(name));
  }

  /// Evaluate `expr` into `dest`, leaving the cursor on `dest`.
  fn expr(&mut self, expr: &Expr, dest: usize) {
    match expr {
      Expr::Num(value) => self.set_literal(dest, *value),
      Expr::Var(name) => self.copy(self.var_cell(*name), dest, self.t(2)),
      Expr::Binary { op, lhs, rhs } => {
        debug_assert_ne!(dest, self.t(1));
        self.expr(lhs, dest);
        self.expr(rhs, self.t(1));
        let rhs_cell = self.t(1);
        self.repeat_at(rhs_cell, |e| {
          e.dec(1);
          e.move_to(dest);
          match op {
            BinOp::Add => e.inc(1),
            BinOp::Sub => e.dec(1),
          }
        });
        self.move_to(dest);
      }
    }
  }

  /// Lower a comparison into the accumulator as exactly 0 or 1.
  ///
  /// Both sides are materialised and counted down simultaneously while both
  /// are non-zero, which removes `min(x, literal)` from each. The
  /// remainders decide every operator:
  ///
  /// ```text
  /// x >  k  ⇔  a != 0        x <  k  ⇔  b != 0
  /// x >= k  ⇔  b == 0        x <= k  ⇔  a == 0
  /// x == k  ⇔  a == 0 and b == 0
  /// ```
  fn comparison(&mut self, cmp: &Comparison) {
    let x = self.var_cell(cmp.name);
    let (cond, a, b, flag, probe, scratch) =
      (self.t(0), self.t(1), self.t(2), self.t(3), self.t(4), self.t(5));

    self.copy(x, a, scratch);
    self.set_literal(b, cmp.literal);

    self.countdown_flag(a, b, flag, probe, scratch, cond);
    self.repeat_at(flag, |e| {
      e.move_to(a);
      e.dec(1);
      e.move_to(b);
      e.dec(1);
      e.countdown_flag(a, b, flag, probe, scratch, cond);
    });

    self.clear(cond);
    match cmp.op {
      CmpOp::Gt => self.flag_nonzero(a, cond, true),
      CmpOp::Lt => self.flag_nonzero(b, cond, true),
      CmpOp::Ge => {
        self.inc(1);
        self.flag_nonzero(b, cond, false);
      }
      CmpOp::Le => {
        self.inc(1);
        self.flag_nonzero(a, cond, false);
      }
      CmpOp::Eq => {
        // Fold b into a: one side is already zero, so a becomes |x - k|.
        self.repeat_at(b, |e| {
          e.dec(1);
          e.move_to(a);
          e.inc(1);
        });
        self.move_to(cond);
        self.inc(1);
        self.flag_nonzero(a, cond, false);
      }
    }
    self.move_to(cond);
  }

  /// Set `flag` to 1 if both `a` and `b` are non-zero, 0 otherwise,
  /// preserving `a` and `b`. Ends with the cursor on `flag`.
  fn countdown_flag(
    &mut self,
    a: usize,
    b: usize,
    flag: usize,
    probe: usize,
    scratch: usize,
    aux: usize,
  ) {
    self.clear(flag);
    self.copy(a, scratch, probe);
    self.flag_nonzero(scratch, probe, true);
    self.repeat_at(probe, |e| {
      e.dec(1);
      e.copy(b, scratch, aux);
      e.flag_nonzero(scratch, flag, true);
    });
    self.move_to(flag);
  }
}
