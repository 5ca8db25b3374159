use swc_core::ecma::ast::*;

use crate::config::Framework;

/// Substrings that mark a callee as a virtual-node factory. Substring match
/// also covers the compiler's `_`-prefixed imports (`_createElementVNode`).
pub const VNODE_FACTORY_NAMES: [&str; 4] = [
    "createVNode",
    "createElementVNode",
    "createBlock",
    "createElementBlock",
];

/// Spellings of the click handler inside a virtual-node props literal.
pub const CLICK_PROP_KEYS: [&str; 2] = ["onClick", "onclick"];

/// JSX attribute that marks a tag as clickable. Exact, case-sensitive.
pub const CLICK_ATTR: &str = "onClick";

/// Method name of an imperative listener registration.
pub const LISTENER_METHOD: &str = "addEventListener";
/// Event name literal a registration must pass first to count as a click.
pub const CLICK_EVENT: &str = "click";

/// A node the classifier knows how to look at.
#[derive(Clone, Copy)]
pub enum Candidate<'a> {
    Tag(&'a JSXOpeningElement),
    Call(&'a CallExpr),
}

/// What a candidate node says about clickability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickIntent {
    /// `<div onClick={...}>`
    DeclarativeAttribute,
    /// `_createElementVNode("div", { onClick: ... })`
    VirtualNodeCall,
    /// `el.addEventListener("click", ...)`
    ListenerRegistration,
    NoMatch,
}

/// Classify a node. At most one variant matches; the framework decides which
/// of the markup shapes is looked at, listener registration is always on.
pub fn classify(node: Candidate<'_>, framework: Framework) -> ClickIntent {
    match (node, framework) {
        (Candidate::Tag(tag), Framework::React) if has_click_attr(tag) => {
            ClickIntent::DeclarativeAttribute
        }
        (Candidate::Tag(_), _) => ClickIntent::NoMatch,
        (Candidate::Call(call), _) if is_click_listener(call) => ClickIntent::ListenerRegistration,
        (Candidate::Call(call), Framework::Vue) if is_clickable_vnode_call(call) => {
            ClickIntent::VirtualNodeCall
        }
        (Candidate::Call(_), _) => ClickIntent::NoMatch,
    }
}

// -----------------------------------------------------------------------------
// JSX
// -----------------------------------------------------------------------------

pub(crate) fn has_jsx_attr(attrs: &[JSXAttrOrSpread], name: &str) -> bool {
    attrs.iter().any(|attr| {
        if let JSXAttrOrSpread::JSXAttr(jsx_attr) = attr {
            if let JSXAttrName::Ident(ident) = &jsx_attr.name {
                return ident.sym.as_ref() == name;
            }
        }
        false
    })
}

fn has_click_attr(tag: &JSXOpeningElement) -> bool {
    has_jsx_attr(&tag.attrs, CLICK_ATTR)
}

// -----------------------------------------------------------------------------
// Virtual nodes
// -----------------------------------------------------------------------------

/// `createVNode` / `_createVNode` / `_ctx.createVNode` -> the last name segment.
fn callee_name(callee: &Callee) -> Option<&str> {
    let Callee::Expr(expr) = callee else {
        return None;
    };
    match &**expr {
        Expr::Ident(id) => Some(id.sym.as_ref()),
        Expr::Member(MemberExpr {
            prop: MemberProp::Ident(prop),
            ..
        }) => Some(prop.sym.as_ref()),
        _ => None,
    }
}

fn is_vnode_factory(call: &CallExpr) -> bool {
    callee_name(&call.callee)
        .map(|name| VNODE_FACTORY_NAMES.iter().any(|f| name.contains(f)))
        .unwrap_or(false)
}

/// The props argument of a virtual-node call, when it is a literal object.
pub(crate) fn vnode_props(call: &CallExpr) -> Option<&ObjectLit> {
    match call.args.get(1) {
        Some(ExprOrSpread { spread: None, expr }) => match &**expr {
            Expr::Object(obj) => Some(obj),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn vnode_props_mut(call: &mut CallExpr) -> Option<&mut ObjectLit> {
    match call.args.get_mut(1) {
        Some(ExprOrSpread { spread: None, expr }) => match &mut **expr {
            Expr::Object(obj) => Some(obj),
            _ => None,
        },
        _ => None,
    }
}

/// Static key of a non-spread property, whatever its form.
fn prop_key(prop: &PropOrSpread) -> Option<&str> {
    let PropOrSpread::Prop(prop) = prop else {
        return None;
    };
    let key = match &**prop {
        Prop::Shorthand(id) => return Some(id.sym.as_ref()),
        Prop::KeyValue(kv) => &kv.key,
        Prop::Method(m) => &m.key,
        Prop::Getter(g) => &g.key,
        Prop::Setter(s) => &s.key,
        Prop::Assign(_) => return None,
    };
    match key {
        PropName::Ident(id) => Some(id.sym.as_ref()),
        PropName::Str(s) => Some(s.value.as_ref()),
        _ => None,
    }
}

pub(crate) fn has_prop_key(obj: &ObjectLit, keys: &[&str]) -> bool {
    obj.props
        .iter()
        .filter_map(prop_key)
        .any(|key| keys.contains(&key))
}

fn is_clickable_vnode_call(call: &CallExpr) -> bool {
    if call.args.len() < 2 || !is_vnode_factory(call) {
        return false;
    }
    vnode_props(call)
        .map(|props| has_prop_key(props, &CLICK_PROP_KEYS))
        .unwrap_or(false)
}

// -----------------------------------------------------------------------------
// Listeners
// -----------------------------------------------------------------------------

/// Receiver of `<recv>.addEventListener(...)`.
pub(crate) fn listener_receiver(call: &CallExpr) -> Option<&Expr> {
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    match &**callee {
        Expr::Member(MemberExpr {
            obj,
            prop: MemberProp::Ident(prop),
            ..
        }) if prop.sym.as_ref() == LISTENER_METHOD => Some(&**obj),
        _ => None,
    }
}

fn is_click_listener(call: &CallExpr) -> bool {
    if call.args.len() < 2 || call.args.iter().take(2).any(|a| a.spread.is_some()) {
        return false;
    }
    if listener_receiver(call).is_none() {
        return false;
    }
    matches!(&*call.args[0].expr, Expr::Lit(Lit::Str(s)) if s.value.as_ref() == CLICK_EVENT)
}
