//! The compilation driver: source file in, typed module listing out.
//!
//! The driver runs the front-end pipeline single-threaded (parse, type
//! engine), reports diagnostics, and on success writes a listing of the
//! typed module surface (globals, structs, functions and their
//! specializations) for the downstream code generator.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::args::CompilerArgs;
use jolt_checker::{CheckerState, ScopeArena, SymbolId};
use jolt_common::{DiagnosticContext, LineMap};
use jolt_parser::ast::{NodeArena, NodeKind};
use jolt_parser::parser::ParserState;
use jolt_types::{NodeId, TypeTable};

pub struct CompileOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub opt_level: u8,
    pub debug_info: bool,
    pub diagnostics_output: Option<PathBuf>,
}

impl CompilerArgs {
    #[must_use]
    pub fn into_options(self) -> CompileOptions {
        let output = self
            .output
            .unwrap_or_else(|| self.input.with_extension("jir"));
        CompileOptions {
            input: self.input,
            output,
            opt_level: self.opt_level,
            debug_info: self.debug_info,
            diagnostics_output: self.diagnostics_output,
        }
    }
}

pub struct CompilationResult {
    pub error_count: u32,
    pub emitted: Option<PathBuf>,
}

pub fn compile(options: &CompileOptions) -> Result<CompilationResult> {
    let file_name = options.input.display().to_string();
    let source = std::fs::read_to_string(&options.input)
        .with_context(|| format!("failed to read {file_name}"))?;

    let mut diags = DiagnosticContext::new(&file_name);
    diags.attach_source(&source);
    if let Some(path) = &options.diagnostics_output {
        let sink = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        diags.set_direct(Box::new(sink));
    }

    let mut parser = ParserState::with_context(&source, diags);
    let program = parser.parse_program();
    let (mut arena, mut types, mut diags) = parser.into_parts();

    let mut scopes = ScopeArena::new();
    {
        let mut checker = CheckerState::new(&mut arena, &mut types, &mut scopes, &mut diags);
        checker.check(program);
    }

    let line_map = LineMap::build(&source);
    if options.diagnostics_output.is_none() {
        crate::reporter::print_diagnostics(&diags, &line_map, &source);
    }

    if diags.has_errors() {
        return Ok(CompilationResult {
            error_count: diags.count(jolt_common::Severity::Error),
            emitted: None,
        });
    }

    write_listing(
        &options.output,
        options,
        &file_name,
        &arena,
        &types,
        &scopes,
        program,
        &line_map,
        &source,
    )
    .with_context(|| format!("failed to write {}", options.output.display()))?;
    info!(output = %options.output.display(), "module written");

    Ok(CompilationResult {
        error_count: 0,
        emitted: Some(options.output.clone()),
    })
}

/// Write the typed module surface: globals with resolved types, struct
/// shapes, and every function with its specializations.
fn write_listing(
    path: &Path,
    options: &CompileOptions,
    file_name: &str,
    arena: &NodeArena,
    types: &TypeTable,
    scopes: &ScopeArena,
    program: NodeId,
    line_map: &LineMap,
    source: &str,
) -> std::io::Result<()> {
    let mut out = File::create(path)?;
    writeln!(out, "; jolt module {file_name}")?;
    writeln!(
        out,
        "; opt-level {}{}",
        options.opt_level,
        if options.debug_info { ", debug-info" } else { "" }
    )?;

    let NodeKind::Program { stmts, .. } = &arena.get(program).kind else {
        return Ok(());
    };
    for &stmt in stmts {
        let location = |span: jolt_common::Span| {
            if options.debug_info {
                let pos = line_map.offset_to_position(span.start, source);
                format!(" ; line {}", pos.line + 1)
            } else {
                String::new()
            }
        };
        match &arena.get(stmt).kind {
            NodeKind::VarDecl {
                name,
                name_span,
                symbol: Some(symbol),
                decl_kind,
                ..
            } => {
                let sym = scopes.symbol(SymbolId(*symbol));
                let keyword = match decl_kind {
                    jolt_parser::ast::DeclKind::Const => "const",
                    _ => "global",
                };
                writeln!(
                    out,
                    "{keyword} {name}: {}{}",
                    types.display(types.resolve_alias(sym.ty)),
                    location(*name_span)
                )?;
            }
            NodeKind::StructDecl {
                name,
                name_span,
                symbol: Some(symbol),
                ..
            } => {
                let sym = scopes.symbol(SymbolId(*symbol));
                let fields = types
                    .object_fields(sym.ty)
                    .map(|fields| {
                        fields
                            .iter()
                            .map(|(n, t)| format!("{n}: {}", types.display(*t)))
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .unwrap_or_default();
                writeln!(out, "struct {name} {{ {fields} }}{}", location(*name_span))?;
            }
            NodeKind::FunctionDecl {
                name,
                name_span,
                symbol: Some(symbol),
                external,
                ..
            } => {
                let sym = scopes.symbol(SymbolId(*symbol));
                let Some(f) = types.function(sym.ty) else {
                    continue;
                };
                let params: Vec<String> =
                    f.params.iter().map(|p| types.display(*p)).collect();
                let keyword = if *external { "external function" } else { "function" };
                writeln!(
                    out,
                    "{keyword} {name}({}{}): {}{}",
                    params.join(", "),
                    if f.variadic { ", ..." } else { "" },
                    types.display(types.resolve_alias(f.ret)),
                    location(*name_span)
                )?;
                for spec in &f.specializations {
                    let spec_params: Vec<String> =
                        spec.params.iter().map(|p| types.display(*p)).collect();
                    writeln!(
                        out,
                        "  specialization {}({}): {}",
                        spec.mangled,
                        spec_params.join(", "),
                        types.display(types.resolve_alias(spec.ret)),
                    )?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}
