use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, SourceMap, DUMMY_SP};
use swc_core::ecma::ast::{Program, Script, Stmt};
use swc_core::ecma::codegen::{text_writer::JsWriter, Config, Emitter};
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::{EsSyntax, Parser, StringInput, Syntax};
use swc_core::ecma::visit::VisitMutWith;

use crate::{AutoCursorTransform, Framework};

pub(crate) fn parse(code: &str) -> Program {
    let cm: Lrc<SourceMap> = Default::default();
    parse_with(&cm, code, false)
}

pub(crate) fn parse_script(code: &str) -> Program {
    let cm: Lrc<SourceMap> = Default::default();
    parse_with(&cm, code, true)
}

fn parse_with(cm: &Lrc<SourceMap>, code: &str, script: bool) -> Program {
    let fm = cm.new_source_file(
        Lrc::new(FileName::Custom("test.jsx".into())),
        code.to_string(),
    );
    let lexer = Lexer::new(
        Syntax::Es(EsSyntax {
            jsx: true,
            ..Default::default()
        }),
        Default::default(),
        StringInput::from(&*fm),
        None,
    );
    let mut parser = Parser::new_from(lexer);
    let program = if script {
        Program::Script(parser.parse_script().expect("failed to parse script"))
    } else {
        parser.parse_program().expect("failed to parse program")
    };
    assert!(parser.take_errors().is_empty());
    program
}

/// Minified print, so spans and original formatting never leak into comparisons.
pub(crate) fn print(program: &Program) -> String {
    let cm: Lrc<SourceMap> = Default::default();
    let mut buf = Vec::new();
    {
        let writer = JsWriter::new(cm.clone(), "\n", &mut buf, None);
        let mut emitter = Emitter {
            cfg: Config::default().with_minify(true),
            comments: None,
            cm: cm.clone(),
            wr: writer,
        };
        match program {
            Program::Module(m) => emitter.emit_module(m),
            Program::Script(s) => emitter.emit_script(s),
        }
        .expect("failed to emit program");
    }
    String::from_utf8(buf).expect("output is not valid UTF-8")
}

pub(crate) fn print_stmts(stmts: Vec<Stmt>) -> String {
    print(&Program::Script(Script {
        span: DUMMY_SP,
        body: stmts,
        shebang: None,
    }))
}

pub(crate) fn normalize(code: &str) -> String {
    print(&parse(code))
}

pub(crate) fn normalize_script(code: &str) -> String {
    print(&parse_script(code))
}

pub(crate) fn run(program: &mut Program, framework: Framework) {
    program.visit_mut_with(&mut AutoCursorTransform::new(framework));
}

pub(crate) fn transform(code: &str, framework: Framework) -> String {
    let mut program = parse(code);
    run(&mut program, framework);
    print(&program)
}
