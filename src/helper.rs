use swc_core::{
    common::{SyntaxContext, DUMMY_SP},
    ecma::ast::*,
};

/// Name of the runtime helper every injected site calls.
pub const HELPER_NAME: &str = "__autoCursorPointer";

const ELEMENT_PARAM: &str = "element";
const COMPUTED_LOCAL: &str = "computedCursor";

/// Computed cursor values that count as "nobody chose a cursor".
const UNSET_CURSOR_VALUES: [&str; 2] = ["auto", "default"];

// -----------------------------------------------------------------------------
// AST builders
// -----------------------------------------------------------------------------

pub(crate) fn ident(name: &str) -> Ident {
    Ident::new(name.into(), DUMMY_SP, SyntaxContext::empty())
}

pub(crate) fn ident_expr(name: &str) -> Box<Expr> {
    Box::new(Expr::Ident(ident(name)))
}

pub(crate) fn str_expr(value: &str) -> Box<Expr> {
    Box::new(Expr::Lit(Lit::Str(Str {
        span: DUMMY_SP,
        value: value.into(),
        raw: None,
    })))
}

pub(crate) fn member(obj: Box<Expr>, prop: &str) -> Box<Expr> {
    Box::new(Expr::Member(MemberExpr {
        span: DUMMY_SP,
        obj,
        prop: MemberProp::Ident(IdentName::new(prop.into(), DUMMY_SP)),
    }))
}

pub(crate) fn call(callee: Box<Expr>, args: Vec<Box<Expr>>) -> Box<Expr> {
    Box::new(Expr::Call(CallExpr {
        span: DUMMY_SP,
        callee: Callee::Expr(callee),
        args: args
            .into_iter()
            .map(|expr| ExprOrSpread { spread: None, expr })
            .collect(),
        type_args: None,
        ctxt: SyntaxContext::empty(),
    }))
}

pub(crate) fn binding(id: Ident) -> Pat {
    Pat::Ident(BindingIdent { id, type_ann: None })
}

pub(crate) fn arrow(params: Vec<Pat>, body: BlockStmtOrExpr) -> Box<Expr> {
    Box::new(Expr::Arrow(ArrowExpr {
        span: DUMMY_SP,
        params,
        body: Box::new(body),
        is_async: false,
        is_generator: false,
        type_params: None,
        return_type: None,
        ctxt: SyntaxContext::empty(),
    }))
}

pub(crate) fn block(stmts: Vec<Stmt>) -> BlockStmt {
    BlockStmt {
        span: DUMMY_SP,
        stmts,
        ctxt: SyntaxContext::empty(),
    }
}

pub(crate) fn expr_stmt(expr: Box<Expr>) -> Stmt {
    Stmt::Expr(ExprStmt {
        span: DUMMY_SP,
        expr,
    })
}

fn not(arg: Box<Expr>) -> Box<Expr> {
    Box::new(Expr::Unary(UnaryExpr {
        span: DUMMY_SP,
        op: UnaryOp::Bang,
        arg,
    }))
}

fn bin(op: BinaryOp, left: Box<Expr>, right: Box<Expr>) -> Box<Expr> {
    Box::new(Expr::Bin(BinExpr {
        span: DUMMY_SP,
        op,
        left,
        right,
    }))
}

/// `<target>.style.cursor`
fn inline_cursor(target: &str) -> Box<Expr> {
    member(member(ident_expr(target), "style"), "cursor")
}

/// `__autoCursorPointer(<arg>)`
pub fn helper_call(arg: Box<Expr>) -> Box<Expr> {
    call(ident_expr(HELPER_NAME), vec![arg])
}

// -----------------------------------------------------------------------------
// Helper template
// -----------------------------------------------------------------------------

/// Builds the per-unit runtime helper:
///
/// ```js
/// function __autoCursorPointer(element) {
///   if (!element) return;
///   setTimeout(() => {
///     if (!element.style.cursor) {
///       const computedCursor = window.getComputedStyle(element).cursor;
///       if (!computedCursor || computedCursor === "auto" || computedCursor === "default")
///         element.style.cursor = "pointer";
///     }
///   }, 0);
/// }
/// ```
///
/// The inline check runs inside the deferred callback so the framework has
/// already applied its own inline styles by then.
pub fn helper_declaration() -> Stmt {
    // if (!element) return;
    let null_guard = Stmt::If(IfStmt {
        span: DUMMY_SP,
        test: not(ident_expr(ELEMENT_PARAM)),
        cons: Box::new(Stmt::Return(ReturnStmt {
            span: DUMMY_SP,
            arg: None,
        })),
        alt: None,
    });

    // const computedCursor = window.getComputedStyle(element).cursor;
    let computed = Stmt::Decl(Decl::Var(Box::new(VarDecl {
        span: DUMMY_SP,
        kind: VarDeclKind::Const,
        declare: false,
        decls: vec![VarDeclarator {
            span: DUMMY_SP,
            name: binding(ident(COMPUTED_LOCAL)),
            init: Some(member(
                call(
                    member(ident_expr("window"), "getComputedStyle"),
                    vec![ident_expr(ELEMENT_PARAM)],
                ),
                "cursor",
            )),
            definite: false,
        }],
        ctxt: SyntaxContext::empty(),
    })));

    // !computedCursor || computedCursor === "auto" || computedCursor === "default"
    let unset = UNSET_CURSOR_VALUES
        .iter()
        .fold(not(ident_expr(COMPUTED_LOCAL)), |acc, value| {
            bin(
                BinaryOp::LogicalOr,
                acc,
                bin(BinaryOp::EqEqEq, ident_expr(COMPUTED_LOCAL), str_expr(value)),
            )
        });

    // element.style.cursor = "pointer";
    let fill_pointer = expr_stmt(Box::new(Expr::Assign(AssignExpr {
        span: DUMMY_SP,
        op: AssignOp::Assign,
        left: AssignTarget::Simple(SimpleAssignTarget::Member(MemberExpr {
            span: DUMMY_SP,
            obj: member(ident_expr(ELEMENT_PARAM), "style"),
            prop: MemberProp::Ident(IdentName::new("cursor".into(), DUMMY_SP)),
        })),
        right: str_expr("pointer"),
    })));

    let inline_unset = Stmt::If(IfStmt {
        span: DUMMY_SP,
        test: not(inline_cursor(ELEMENT_PARAM)),
        cons: Box::new(Stmt::Block(block(vec![
            computed,
            Stmt::If(IfStmt {
                span: DUMMY_SP,
                test: unset,
                cons: Box::new(fill_pointer),
                alt: None,
            }),
        ]))),
        alt: None,
    });

    // setTimeout(() => { ... }, 0);
    let deferred = expr_stmt(call(
        ident_expr("setTimeout"),
        vec![
            arrow(vec![], BlockStmtOrExpr::BlockStmt(block(vec![inline_unset]))),
            Box::new(Expr::Lit(Lit::Num(Number {
                span: DUMMY_SP,
                value: 0.0,
                raw: None,
            }))),
        ],
    ));

    Stmt::Decl(Decl::Fn(FnDecl {
        ident: ident(HELPER_NAME),
        declare: false,
        function: Box::new(Function {
            params: vec![Param {
                span: DUMMY_SP,
                decorators: vec![],
                pat: binding(ident(ELEMENT_PARAM)),
            }],
            decorators: vec![],
            span: DUMMY_SP,
            body: Some(block(vec![null_guard, deferred])),
            is_generator: false,
            is_async: false,
            type_params: None,
            return_type: None,
            ctxt: SyntaxContext::empty(),
        }),
    }))
}

/// True for a top-level `function __autoCursorPointer(...) {}`.
pub fn is_helper_declaration(stmt: &Stmt) -> bool {
    matches!(stmt, Stmt::Decl(Decl::Fn(f)) if f.ident.sym.as_ref() == HELPER_NAME)
}
