use swc_core::{
    common::DUMMY_SP,
    ecma::{
        ast::*,
        utils::{StmtLike, StmtOrModuleItem},
        visit::{VisitMut, VisitMutWith},
    },
};
use tracing::debug;

use crate::config::Framework;
use crate::detect::{classify, Candidate, ClickIntent};
use crate::helper::{block, helper_declaration, is_helper_declaration};
use crate::inject::{
    capture_listener_target, follow_up_stmt, helper_call_arg, inject_mount_hook, inject_ref,
    is_follow_up_for, split_exit, temp_declaration, ListenerTarget, TempNames,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassState {
    Idle,
    Injected,
}

/// Statements to place around the statement that registered listeners.
struct Settled {
    decl: Option<Stmt>,
    calls: Vec<Stmt>,
}

/// One pass over one compilation unit. Detects click-intent sites, injects
/// the mount-time cursor check, and prepends the shared helper once if
/// anything was injected.
pub struct AutoCursorTransform {
    framework: Framework,
    state: PassState,
    names: TempNames,

    // Listener follow-ups waiting for their enclosing statement.
    follow_ups: Vec<ListenerTarget>,
    // A statement of the current function encloses the node being visited.
    anchored: bool,
    // The next `visit_mut_stmt` is for an item of a statement list.
    in_stmt_list: bool,
}

impl AutoCursorTransform {
    pub fn new(framework: Framework) -> Self {
        Self {
            framework,
            state: PassState::Idle,
            names: TempNames::default(),
            follow_ups: vec![],
            anchored: false,
            in_stmt_list: false,
        }
    }

    fn mark_injected(&mut self, intent: ClickIntent) {
        debug!(?intent, "injected pointer cursor check");
        self.state = PassState::Injected;
    }

    /// Runs `visit` with an empty follow-up buffer and returns what it queued.
    fn collect_follow_ups(&mut self, visit: impl FnOnce(&mut Self)) -> Vec<ListenerTarget> {
        let outer = std::mem::take(&mut self.follow_ups);
        let anchored = std::mem::replace(&mut self.anchored, true);
        visit(self);
        self.anchored = anchored;
        std::mem::replace(&mut self.follow_ups, outer)
    }

    /// Function-like boundary: statements outside it are out of scope for
    /// anything inside it.
    fn unanchored(&mut self, visit: impl FnOnce(&mut Self)) {
        let anchored = std::mem::replace(&mut self.anchored, false);
        visit(self);
        self.anchored = anchored;
    }

    /// Drops follow-ups already present right after the statement (a previous
    /// run, or the author) and duplicates within the same statement.
    fn settle<'a>(
        &mut self,
        produced: Vec<ListenerTarget>,
        following: impl Iterator<Item = &'a Stmt>,
    ) -> Settled {
        let existing: Vec<&Stmt> = following
            .take_while(|stmt| helper_call_arg(stmt).is_some())
            .collect();
        let mut temps = vec![];
        let mut calls: Vec<Stmt> = vec![];
        for target in produced {
            let present = existing
                .iter()
                .copied()
                .chain(calls.iter())
                .any(|stmt| is_follow_up_for(stmt, &target.expr));
            if present {
                debug!("listener follow-up already present");
                continue;
            }
            temps.extend(target.temp);
            calls.push(follow_up_stmt(target.expr));
        }
        if !calls.is_empty() {
            self.mark_injected(ClickIntent::ListenerRegistration);
        }
        Settled {
            decl: (!temps.is_empty()).then(|| temp_declaration(temps)),
            calls,
        }
    }

    /// `stmt` with its follow-ups around it. A `return` or `throw` stays last,
    /// its value held in a local so the follow-ups still run.
    fn place(&mut self, mut stmt: Stmt, Settled { decl, calls }: Settled) -> Vec<Stmt> {
        let mut stmts: Vec<Stmt> = decl.into_iter().collect();
        match split_exit(&mut stmt, &mut self.names) {
            Some(result) => {
                stmts.push(result);
                stmts.extend(calls);
                stmts.push(stmt);
            }
            None => {
                stmts.push(stmt);
                stmts.extend(calls);
            }
        }
        stmts
    }

    fn visit_mut_stmt_likes<T>(&mut self, items: &mut Vec<T>)
    where
        T: StmtLike + StmtOrModuleItem + VisitMutWith<Self>,
    {
        let mut i = 0;
        while i < items.len() {
            let is_stmt = StmtLike::as_stmt(&items[i]).is_some();
            let produced = self.collect_follow_ups(|this| {
                this.in_stmt_list = is_stmt;
                items[i].visit_mut_with(this);
                this.in_stmt_list = false;
            });
            if produced.is_empty() {
                i += 1;
                continue;
            }

            let Settled { decl, calls } = self.settle(
                produced,
                items[i + 1..].iter().map_while(|item| StmtLike::as_stmt(item)),
            );
            if let Some(decl) = decl {
                items.insert(i, T::from_stmt(decl));
                i += 1;
            }
            let inserted = calls.len();
            for (offset, call) in calls.into_iter().enumerate() {
                items.insert(i + 1 + offset, T::from_stmt(call));
            }
            i += 1 + inserted;
        }
    }

    /// Prepends the helper after any directive prologue, once.
    fn finish_unit<T: StmtLike + StmtOrModuleItem>(&mut self, body: &mut Vec<T>) {
        if std::mem::replace(&mut self.state, PassState::Idle) == PassState::Idle {
            return;
        }
        let declared = body
            .iter()
            .filter_map(|item| StmtLike::as_stmt(item))
            .any(is_helper_declaration);
        if declared {
            debug!("helper already declared in this unit");
            return;
        }
        let at = body
            .iter()
            .take_while(|item| StmtLike::as_stmt(*item).map(is_directive).unwrap_or(false))
            .count();
        body.insert(at, T::from_stmt(helper_declaration()));
    }
}

fn is_exit(stmt: &Stmt) -> bool {
    matches!(stmt, Stmt::Return(ReturnStmt { arg: Some(_), .. }) | Stmt::Throw(_))
}

fn is_directive(stmt: &Stmt) -> bool {
    matches!(stmt, Stmt::Expr(ExprStmt { expr, .. }) if matches!(&**expr, Expr::Lit(Lit::Str(_))))
}

impl VisitMut for AutoCursorTransform {
    fn visit_mut_module(&mut self, m: &mut Module) {
        self.names = TempNames::collect(&*m);
        m.visit_mut_children_with(self);
        self.finish_unit(&mut m.body);
    }

    fn visit_mut_script(&mut self, s: &mut Script) {
        self.names = TempNames::collect(&*s);
        s.visit_mut_children_with(self);
        self.finish_unit(&mut s.body);
    }

    fn visit_mut_module_items(&mut self, items: &mut Vec<ModuleItem>) {
        self.visit_mut_stmt_likes(items);
    }

    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        self.visit_mut_stmt_likes(stmts);
    }

    /// Statements outside a list (`if` branches, loop bodies) and exits get
    /// wrapped in a block when a listener inside them needs a follow-up.
    fn visit_mut_stmt(&mut self, s: &mut Stmt) {
        if std::mem::take(&mut self.in_stmt_list) && !is_exit(s) {
            s.visit_mut_children_with(self);
            return;
        }
        let produced = self.collect_follow_ups(|this| s.visit_mut_children_with(this));
        if produced.is_empty() {
            return;
        }
        let settled = self.settle(produced, std::iter::empty());
        if settled.calls.is_empty() {
            return;
        }
        let inner = std::mem::replace(s, Stmt::Empty(EmptyStmt { span: DUMMY_SP }));
        *s = Stmt::Block(block(self.place(inner, settled)));
    }

    fn visit_mut_function(&mut self, n: &mut Function) {
        self.unanchored(|this| n.visit_mut_children_with(this));
    }

    /// An expression body that registers a click listener becomes
    /// `{ const _cursorResult = <body>; __autoCursorPointer(t); return _cursorResult; }`.
    fn visit_mut_arrow_expr(&mut self, n: &mut ArrowExpr) {
        self.unanchored(|this| {
            n.params.visit_mut_with(this);
            if let BlockStmtOrExpr::BlockStmt(body) = &mut *n.body {
                body.visit_mut_with(this);
            }
        });
        let BlockStmtOrExpr::Expr(expr) = &mut *n.body else {
            return;
        };
        let produced = self.collect_follow_ups(|this| expr.visit_mut_with(this));
        if produced.is_empty() {
            return;
        }
        let settled = self.settle(produced, std::iter::empty());
        if settled.calls.is_empty() {
            return;
        }
        let value = std::mem::replace(expr, Box::new(Expr::Invalid(Invalid { span: DUMMY_SP })));
        let exit = Stmt::Return(ReturnStmt {
            span: DUMMY_SP,
            arg: Some(value),
        });
        *n.body = BlockStmtOrExpr::BlockStmt(block(self.place(exit, settled)));
    }

    fn visit_mut_class(&mut self, n: &mut Class) {
        self.unanchored(|this| n.visit_mut_children_with(this));
    }

    fn visit_mut_call_expr(&mut self, n: &mut CallExpr) {
        match classify(Candidate::Call(&*n), self.framework) {
            ClickIntent::VirtualNodeCall => {
                if inject_mount_hook(n) {
                    self.mark_injected(ClickIntent::VirtualNodeCall);
                } else {
                    debug!("virtual node already has a mount hook, skipping");
                }
            }
            ClickIntent::ListenerRegistration => {
                if !self.anchored {
                    debug!("click listener has no enclosing statement in scope, skipping");
                } else if let Some(target) = capture_listener_target(n, &mut self.names) {
                    self.follow_ups.push(target);
                }
            }
            ClickIntent::DeclarativeAttribute | ClickIntent::NoMatch => {}
        }
        n.visit_mut_children_with(self);
    }

    fn visit_mut_jsx_opening_element(&mut self, n: &mut JSXOpeningElement) {
        if classify(Candidate::Tag(&*n), self.framework) == ClickIntent::DeclarativeAttribute {
            if inject_ref(n) {
                self.mark_injected(ClickIntent::DeclarativeAttribute);
            } else {
                debug!("element already has a ref, skipping");
            }
        }
        n.visit_mut_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        normalize, normalize_script, parse, parse_script, print, run, transform,
    };

    const HELPER: &str = r#"
        function __autoCursorPointer(element) {
          if (!element) return;
          setTimeout(() => {
            if (!element.style.cursor) {
              const computedCursor = window.getComputedStyle(element).cursor;
              if (!computedCursor || computedCursor === "auto" || computedCursor === "default")
                element.style.cursor = "pointer";
            }
          }, 0);
        }
    "#;

    fn with_helper(code: &str) -> String {
        normalize(&format!("{HELPER}\n{code}"))
    }

    fn assert_unchanged(code: &str, framework: Framework) {
        assert_eq!(transform(code, framework), normalize(code));
    }

    fn helper_count(printed: &str) -> usize {
        printed.matches("function __autoCursorPointer(").count()
    }

    // ---------- declarative attribute ----------

    #[test]
    fn adds_ref_to_clickable_jsx() {
        assert_eq!(
            transform(
                "const App = () => <button onClick={go}>Hi</button>;",
                Framework::React
            ),
            with_helper(
                "const App = () => <button onClick={go} ref={(el) => __autoCursorPointer(el)}>Hi</button>;"
            )
        );
    }

    #[test]
    fn keeps_an_existing_ref() {
        assert_unchanged(
            "const App = () => <button onClick={go} ref={mine}>Hi</button>;",
            Framework::React,
        );
    }

    #[test]
    fn one_helper_for_many_sites() {
        let out = transform(
            r#"
            const App = () => (
              <ul>
                <li onClick={a}>A</li>
                <li onClick={b}>B</li>
                <li>C</li>
              </ul>
            );
            document.body.addEventListener("click", c);
            "#,
            Framework::React,
        );
        assert_eq!(helper_count(&out), 1);
        assert_eq!(out.matches("ref=").count(), 2);
        assert_eq!(out.matches("__autoCursorPointer(document.body)").count(), 1);
    }

    #[test]
    fn jsx_is_left_alone_in_vue_mode() {
        assert_unchanged("const App = () => <button onClick={go} />;", Framework::Vue);
    }

    // ---------- virtual nodes ----------

    const VUE_IMPORT: &str = r#"import { createElementVNode as _createElementVNode } from "vue";"#;

    #[test]
    fn adds_mount_hook_to_clickable_vnode() {
        let input = format!(
            r#"{VUE_IMPORT}
            export function render(_ctx) {{
              return _createElementVNode("button", {{ onClick: _ctx.go }}, "Hi");
            }}"#
        );
        let expected = with_helper(&format!(
            r#"{VUE_IMPORT}
            export function render(_ctx) {{
              return _createElementVNode("button", {{ onClick: _ctx.go, onVnodeMounted: (vnode) => __autoCursorPointer(vnode.el) }}, "Hi");
            }}"#
        ));
        assert_eq!(transform(&input, Framework::Vue), expected);
    }

    #[test]
    fn lower_case_click_key_is_equivalent() {
        assert_eq!(
            transform(r#"_createVNode("div", { onclick: go });"#, Framework::Vue),
            with_helper(
                r#"_createVNode("div", { onclick: go, onVnodeMounted: (vnode) => __autoCursorPointer(vnode.el) });"#
            )
        );
    }

    #[test]
    fn keeps_an_existing_mount_hook() {
        assert_unchanged(
            r#"_createVNode("div", { onClick: go, onVnodeMounted: mine });"#,
            Framework::Vue,
        );
    }

    #[test]
    fn non_literal_props_never_match() {
        for code in [
            r#"_createVNode("div", props);"#,
            r#"_createVNode("div", null, [child]);"#,
            r#"_createVNode("div", _mergeProps({ onClick: go }, attrs));"#,
        ] {
            // The nested literal in `_mergeProps(...)` is not a vnode call's props.
            assert_unchanged(code, Framework::Vue);
        }
    }

    #[test]
    fn vnode_calls_are_left_alone_in_react_mode() {
        assert_unchanged(r#"_createVNode("div", { onClick: go });"#, Framework::React);
    }

    // ---------- listener registration ----------

    #[test]
    fn follows_a_click_listener_with_the_helper() {
        for framework in [Framework::React, Framework::Vue] {
            assert_eq!(
                transform(
                    r#"const el = document.getElementById("a"); el.addEventListener("click", go); done();"#,
                    framework
                ),
                with_helper(
                    r#"const el = document.getElementById("a"); el.addEventListener("click", go); __autoCursorPointer(el); done();"#
                )
            );
        }
    }

    #[test]
    fn captures_a_side_effecting_receiver() {
        assert_eq!(
            transform(
                r#"document.querySelector(".btn").addEventListener("click", go);"#,
                Framework::Vue
            ),
            with_helper(
                r#"let _cursorTarget;
                (_cursorTarget = document.querySelector(".btn")).addEventListener("click", go);
                __autoCursorPointer(_cursorTarget);"#
            )
        );
    }

    #[test]
    fn wraps_single_statement_bodies() {
        assert_eq!(
            transform(r#"if (ready) el.addEventListener("click", go);"#, Framework::Vue),
            with_helper(
                r#"if (ready) { el.addEventListener("click", go); __autoCursorPointer(el); }"#
            )
        );
    }

    #[test]
    fn inserts_inside_the_enclosing_function() {
        assert_eq!(
            transform(
                r#"function setup(el) { el.addEventListener("click", go); return el; }"#,
                Framework::React
            ),
            with_helper(
                r#"function setup(el) { el.addEventListener("click", go); __autoCursorPointer(el); return el; }"#
            )
        );
    }

    #[test]
    fn keeps_returned_listeners_reachable() {
        assert_eq!(
            transform(
                r#"function bind(el, f) { return el.addEventListener("click", f); }"#,
                Framework::Vue
            ),
            with_helper(
                r#"function bind(el, f) {
                  {
                    const _cursorResult = el.addEventListener("click", f);
                    __autoCursorPointer(el);
                    return _cursorResult;
                  }
                }"#
            )
        );
    }

    #[test]
    fn captures_before_a_conditional_return() {
        assert_eq!(
            transform(
                r#"function on(ok) { if (ok) return q().addEventListener("click", go); }"#,
                Framework::React
            ),
            with_helper(
                r#"function on(ok) {
                  if (ok) {
                    let _cursorTarget;
                    const _cursorResult = (_cursorTarget = q()).addEventListener("click", go);
                    __autoCursorPointer(_cursorTarget);
                    return _cursorResult;
                  }
                }"#
            )
        );
    }

    #[test]
    fn keeps_thrown_listeners_reachable() {
        assert_eq!(
            transform(
                r#"function fail(el) { throw el.addEventListener("click", go); }"#,
                Framework::Vue
            ),
            with_helper(
                r#"function fail(el) {
                  {
                    const _cursorResult = el.addEventListener("click", go);
                    __autoCursorPointer(el);
                    throw _cursorResult;
                  }
                }"#
            )
        );
    }

    #[test]
    fn expands_expression_bodied_arrows() {
        assert_eq!(
            transform(
                r#"items.forEach((el) => el.addEventListener("click", go));"#,
                Framework::Vue
            ),
            with_helper(
                r#"items.forEach((el) => {
                  const _cursorResult = el.addEventListener("click", go);
                  __autoCursorPointer(el);
                  return _cursorResult;
                });"#
            )
        );
    }

    #[test]
    fn leaves_other_arrows_alone() {
        assert_unchanged(r#"items.map((el) => el.id);"#, Framework::Vue);
        assert_unchanged(
            r#"items.forEach((el) => el.addEventListener("keyup", go));"#,
            Framework::Vue,
        );
    }

    #[test]
    fn skips_listeners_without_a_statement_in_scope() {
        assert_unchanged(
            r#"class A { off = this.el.addEventListener("click", go); }"#,
            Framework::Vue,
        );
        assert_unchanged(
            r#"function f(off = el.addEventListener("click", go)) {}"#,
            Framework::Vue,
        );
    }

    #[test]
    fn ignores_other_events() {
        assert_unchanged(r#"el.addEventListener("mouseover", go);"#, Framework::React);
    }

    #[test]
    fn one_follow_up_per_receiver_and_statement() {
        let out = transform(
            r#"el.addEventListener("click", a), el.addEventListener("click", b);"#,
            Framework::Vue,
        );
        assert_eq!(out.matches("__autoCursorPointer(el)").count(), 1);
    }

    // ---------- unit level ----------

    #[test]
    fn units_without_sites_are_unchanged() {
        assert_unchanged(
            r#"import x from "y"; export const a = () => <div title="t" />; el.addEventListener("keydown", f);"#,
            Framework::React,
        );
    }

    #[test]
    fn running_twice_is_idempotent() {
        let cases = [
            (
                r#"const A = () => <a onClick={go} />; q().addEventListener("click", go); if (x) el.addEventListener("click", go);"#,
                Framework::React,
            ),
            (
                r#"_createVNode("div", { onClick: go }); el.addEventListener("click", go);"#,
                Framework::Vue,
            ),
            (
                r#"function bind(ok) { if (ok) return q().addEventListener("click", go); throw el.addEventListener("click", go); }"#,
                Framework::Vue,
            ),
            (
                r#"items.forEach((el) => el.addEventListener("click", go));"#,
                Framework::React,
            ),
        ];
        for (code, framework) in cases {
            let mut program = parse(code);
            run(&mut program, framework);
            let once = print(&program);
            run(&mut program, framework);
            assert_eq!(print(&program), once, "in-memory rerun of {code}");
            assert_eq!(transform(&once, framework), normalize(&once), "reparsed rerun of {code}");
            assert_eq!(helper_count(&once), 1);
        }
    }

    #[test]
    fn does_not_redeclare_an_existing_helper() {
        let out = transform(
            &format!("{HELPER}\nconst B = () => <b onClick={{go}} />;"),
            Framework::React,
        );
        assert_eq!(helper_count(&out), 1);
        assert_eq!(
            out,
            with_helper("const B = () => <b onClick={go} ref={(el) => __autoCursorPointer(el)} />;")
        );
    }

    #[test]
    fn helper_goes_after_the_directive_prologue() {
        let code = r#""use strict"; el.addEventListener("click", go);"#;
        let mut program = parse_script(code);
        run(&mut program, Framework::Vue);
        assert_eq!(
            print(&program),
            normalize_script(&format!(
                r#""use strict"; {HELPER} el.addEventListener("click", go); __autoCursorPointer(el);"#
            ))
        );
    }

    #[test]
    fn state_does_not_leak_between_units() {
        let mut pass = AutoCursorTransform::new(Framework::React);
        let mut first = parse("<a onClick={go} />;");
        first.visit_mut_with(&mut pass);
        assert_eq!(helper_count(&print(&first)), 1);

        let plain = "<a href='#' />;";
        let mut second = parse(plain);
        second.visit_mut_with(&mut pass);
        assert_eq!(print(&second), normalize(plain));
    }
}
