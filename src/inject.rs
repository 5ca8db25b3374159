use std::collections::HashSet;

use swc_core::{
    common::{EqIgnoreSpan, SyntaxContext, DUMMY_SP},
    ecma::{
        ast::*,
        visit::{Visit, VisitWith},
    },
};

use crate::detect::{has_jsx_attr, has_prop_key, listener_receiver, vnode_props_mut};
use crate::helper::{
    arrow, binding, expr_stmt, helper_call, ident, ident_expr, member, HELPER_NAME,
};

pub const REF_ATTR: &str = "ref";
pub const MOUNT_HOOK: &str = "onVnodeMounted";

const REF_PARAM: &str = "el";
const VNODE_PARAM: &str = "vnode";
const TEMP_BASE: &str = "_cursorTarget";
const RESULT_BASE: &str = "_cursorResult";

// -----------------------------------------------------------------------------
// Declarative attribute
// -----------------------------------------------------------------------------

/// Appends `ref={(el) => __autoCursorPointer(el)}` unless the tag already has
/// a `ref`. An existing ref is never merged into.
pub fn inject_ref(tag: &mut JSXOpeningElement) -> bool {
    if has_jsx_attr(&tag.attrs, REF_ATTR) {
        return false;
    }
    let callback = arrow(
        vec![binding(ident(REF_PARAM))],
        BlockStmtOrExpr::Expr(helper_call(ident_expr(REF_PARAM))),
    );
    tag.attrs.push(JSXAttrOrSpread::JSXAttr(JSXAttr {
        span: DUMMY_SP,
        name: JSXAttrName::Ident(IdentName::new(REF_ATTR.into(), DUMMY_SP)),
        value: Some(JSXAttrValue::JSXExprContainer(JSXExprContainer {
            span: DUMMY_SP,
            expr: JSXExpr::Expr(callback),
        })),
    }));
    true
}

// -----------------------------------------------------------------------------
// Virtual node
// -----------------------------------------------------------------------------

/// Appends `onVnodeMounted: (vnode) => __autoCursorPointer(vnode.el)` to the
/// props literal unless a mount hook is already there.
pub fn inject_mount_hook(call: &mut CallExpr) -> bool {
    let Some(props) = vnode_props_mut(call) else {
        return false;
    };
    if has_prop_key(props, &[MOUNT_HOOK]) {
        return false;
    }
    let callback = arrow(
        vec![binding(ident(VNODE_PARAM))],
        BlockStmtOrExpr::Expr(helper_call(member(ident_expr(VNODE_PARAM), "el"))),
    );
    props
        .props
        .push(PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
            key: PropName::Ident(IdentName::new(MOUNT_HOOK.into(), DUMMY_SP)),
            value: callback,
        }))));
    true
}

// -----------------------------------------------------------------------------
// Listener registration
// -----------------------------------------------------------------------------

/// Expression the follow-up statement hands to the helper.
#[derive(Debug)]
pub struct ListenerTarget {
    pub expr: Box<Expr>,
    /// Temporary that has to be declared before the enclosing statement.
    pub temp: Option<Ident>,
}

/// Receivers that can be evaluated again without observable effects:
/// identifiers, `this`, and member chains over them with static keys.
fn is_stable_reference(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(_) | Expr::This(_) => true,
        Expr::Paren(p) => is_stable_reference(&p.expr),
        Expr::Member(m) => {
            is_stable_reference(&m.obj)
                && match &m.prop {
                    MemberProp::Ident(_) | MemberProp::PrivateName(_) => true,
                    MemberProp::Computed(c) => matches!(&*c.expr, Expr::Lit(_)),
                }
        }
        _ => false,
    }
}

/// `(<ident> = <expr>)` already captures the receiver.
fn captured_ident(expr: &Expr) -> Option<&Ident> {
    match expr {
        Expr::Paren(p) => captured_ident(&p.expr),
        Expr::Assign(AssignExpr {
            op: AssignOp::Assign,
            left: AssignTarget::Simple(SimpleAssignTarget::Ident(b)),
            ..
        }) => Some(&b.id),
        _ => None,
    }
}

/// Picks what the follow-up refers to. Stable receivers are cloned; anything
/// else is rewritten in place into `(<temp> = <receiver>)` so it still runs
/// exactly once.
pub fn capture_listener_target(
    call: &mut CallExpr,
    names: &mut TempNames,
) -> Option<ListenerTarget> {
    let receiver = listener_receiver(call)?;
    if is_stable_reference(receiver) {
        return Some(ListenerTarget {
            expr: Box::new(receiver.clone()),
            temp: None,
        });
    }
    if let Some(id) = captured_ident(receiver) {
        return Some(ListenerTarget {
            expr: Box::new(Expr::Ident(id.clone())),
            temp: None,
        });
    }

    let Callee::Expr(callee) = &mut call.callee else {
        return None;
    };
    let Expr::Member(callee) = &mut **callee else {
        return None;
    };
    let temp = names.fresh();
    let receiver = std::mem::replace(
        &mut callee.obj,
        Box::new(Expr::Invalid(Invalid { span: DUMMY_SP })),
    );
    callee.obj = Box::new(Expr::Paren(ParenExpr {
        span: DUMMY_SP,
        expr: Box::new(Expr::Assign(AssignExpr {
            span: DUMMY_SP,
            op: AssignOp::Assign,
            left: AssignTarget::Simple(SimpleAssignTarget::Ident(BindingIdent {
                id: temp.clone(),
                type_ann: None,
            })),
            right: receiver,
        })),
    }));
    Some(ListenerTarget {
        expr: Box::new(Expr::Ident(temp.clone())),
        temp: Some(temp),
    })
}

/// `__autoCursorPointer(<target>);`
pub fn follow_up_stmt(target: Box<Expr>) -> Stmt {
    expr_stmt(helper_call(target))
}

/// Whether `stmt` is the helper call for `target`.
pub fn is_follow_up_for(stmt: &Stmt, target: &Expr) -> bool {
    helper_call_arg(stmt)
        .map(|arg| arg.eq_ignore_span(target))
        .unwrap_or(false)
}

pub fn helper_call_arg(stmt: &Stmt) -> Option<&Expr> {
    let Stmt::Expr(ExprStmt { expr, .. }) = stmt else {
        return None;
    };
    let Expr::Call(CallExpr {
        callee: Callee::Expr(callee),
        args,
        ..
    }) = &**expr
    else {
        return None;
    };
    match (&**callee, args.as_slice()) {
        (Expr::Ident(id), [arg]) if id.sym.as_ref() == HELPER_NAME && arg.spread.is_none() => {
            Some(&*arg.expr)
        }
        _ => None,
    }
}

/// `let _cursorTarget, _cursorTarget2;`
pub fn temp_declaration(temps: Vec<Ident>) -> Stmt {
    Stmt::Decl(Decl::Var(Box::new(VarDecl {
        span: DUMMY_SP,
        kind: VarDeclKind::Let,
        declare: false,
        decls: temps
            .into_iter()
            .map(|id| VarDeclarator {
                span: DUMMY_SP,
                name: binding(id),
                init: None,
                definite: false,
            })
            .collect(),
        ctxt: SyntaxContext::empty(),
    })))
}

/// Moves the argument of `return <arg>;` / `throw <arg>;` into
/// `const _cursorResult = <arg>;` and leaves `return _cursorResult;` behind,
/// so statements can be placed between the evaluation and the exit.
/// Returns the new declaration; any other statement is left untouched.
pub fn split_exit(stmt: &mut Stmt, names: &mut TempNames) -> Option<Stmt> {
    let arg = match stmt {
        Stmt::Return(ReturnStmt { arg: Some(arg), .. }) => arg,
        Stmt::Throw(ThrowStmt { arg, .. }) => arg,
        _ => return None,
    };
    let result = names.fresh_from(RESULT_BASE);
    let value = std::mem::replace(arg, Box::new(Expr::Ident(result.clone())));
    Some(Stmt::Decl(Decl::Var(Box::new(VarDecl {
        span: DUMMY_SP,
        kind: VarDeclKind::Const,
        declare: false,
        decls: vec![VarDeclarator {
            span: DUMMY_SP,
            name: binding(result),
            init: Some(value),
            definite: false,
        }],
        ctxt: SyntaxContext::empty(),
    }))))
}

// -----------------------------------------------------------------------------
// Temporary names
// -----------------------------------------------------------------------------

/// Hands out `_cursorTarget`, `_cursorTarget2`, ... skipping every name that
/// already occurs in the unit.
#[derive(Default)]
pub struct TempNames {
    used: HashSet<String>,
}

impl TempNames {
    pub fn collect<N: VisitWith<NameCollector>>(node: &N) -> Self {
        let mut collector = NameCollector::default();
        node.visit_with(&mut collector);
        Self {
            used: collector.names,
        }
    }

    pub fn fresh(&mut self) -> Ident {
        self.fresh_from(TEMP_BASE)
    }

    pub fn fresh_from(&mut self, base: &str) -> Ident {
        let mut n = 1usize;
        loop {
            let name = if n == 1 {
                base.to_string()
            } else {
                format!("{base}{n}")
            };
            if self.used.insert(name.clone()) {
                return ident(&name);
            }
            n += 1;
        }
    }
}

#[derive(Default)]
pub struct NameCollector {
    names: HashSet<String>,
}

impl Visit for NameCollector {
    fn visit_ident(&mut self, n: &Ident) {
        self.names.insert(n.sym.to_string());
    }
}
