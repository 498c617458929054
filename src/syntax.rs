/*!
Turns a pattern string into an HIR under the compile options.

Parsing happens in two stages (AST, then HIR translation) so that POSIX
restrictions can be enforced on the AST before any translation happens.
Two option-driven rewrites run on the translated HIR: `never_nl` removes
`\n` from everything the pattern could match, and `never_capture` erases
capture groups.
*/

use regex_syntax::{
    ast::{self, Ast},
    hir::{
        self, Class, ClassBytes, ClassBytesRange, ClassUnicode,
        ClassUnicodeRange, Hir, HirKind,
    },
};

use crate::{
    error::{Error, ErrorCode},
    options::{Encoding, Options},
};

pub(crate) fn parse(pattern: &str, opts: &Options) -> Result<Hir, Error> {
    let quoted;
    let pattern = if opts.get_literal() {
        quoted = regex_syntax::escape(pattern);
        &*quoted
    } else {
        pattern
    };
    let ast = ast::parse::ParserBuilder::new()
        .build()
        .parse(pattern)
        .map_err(|e| Error::from_ast(pattern, &e))?;
    if opts.get_posix_syntax() {
        ast::visit(&ast, PosixCheck { pattern, opts })?;
    }
    let unicode = opts.get_encoding() == Encoding::Utf8;
    let mut translator = hir::translate::TranslatorBuilder::new()
        .utf8(unicode)
        .unicode(unicode)
        .case_insensitive(!opts.get_case_sensitive())
        .multi_line(opts.get_posix_syntax() && !opts.get_one_line())
        .dot_matches_new_line(opts.get_dot_nl())
        .build();
    let mut hir = translator
        .translate(pattern, &ast)
        .map_err(|e| Error::from_hir(pattern, &e))?;
    if opts.get_never_nl() {
        hir = strip_newline(hir);
    }
    if opts.get_never_capture() {
        hir = decapture(hir);
    }
    Ok(hir)
}

/// Rejects constructs outside POSIX egrep syntax, honoring the opt-in
/// escape hatches for Perl classes and word boundaries.
struct PosixCheck<'p> {
    pattern: &'p str,
    opts: &'p Options,
}

impl<'p> PosixCheck<'p> {
    fn reject(&self, code: ErrorCode, span: &ast::Span, what: &str) -> Error {
        let arg = self
            .pattern
            .get(span.start.offset..span.end.offset)
            .unwrap_or("");
        Error::new(code, format!("{}: `{}`", what, arg), arg)
    }
}

impl<'p> ast::Visitor for PosixCheck<'p> {
    type Output = ();
    type Err = Error;

    fn finish(self) -> Result<(), Error> {
        Ok(())
    }

    fn visit_pre(&mut self, ast: &Ast) -> Result<(), Error> {
        match *ast {
            Ast::ClassPerl(ref cls) if !self.opts.get_perl_classes() => {
                Err(self.reject(
                    ErrorCode::BadEscape,
                    &cls.span,
                    "perl character class not allowed in posix syntax",
                ))
            }
            Ast::Assertion(ref a) => {
                use regex_syntax::ast::AssertionKind::*;
                match a.kind {
                    StartLine | EndLine => Ok(()),
                    StartText | EndText => Err(self.reject(
                        ErrorCode::BadEscape,
                        &a.span,
                        "text anchor not allowed in posix syntax",
                    )),
                    _ => {
                        if self.opts.get_word_boundary() {
                            Ok(())
                        } else {
                            Err(self.reject(
                                ErrorCode::BadEscape,
                                &a.span,
                                "word boundary not allowed in posix syntax",
                            ))
                        }
                    }
                }
            }
            Ast::Flags(ref flags) => Err(self.reject(
                ErrorCode::BadPerlOp,
                &flags.span,
                "inline flags not allowed in posix syntax",
            )),
            Ast::Group(ref g) => match g.kind {
                ast::GroupKind::CaptureIndex(_) => Ok(()),
                ast::GroupKind::CaptureName { .. } => Err(self.reject(
                    ErrorCode::BadNamedCapture,
                    &g.span,
                    "named group not allowed in posix syntax",
                )),
                ast::GroupKind::NonCapturing(_) => Err(self.reject(
                    ErrorCode::BadPerlOp,
                    &g.span,
                    "grouping flags not allowed in posix syntax",
                )),
            },
            Ast::Repetition(ref rep) if !rep.greedy => Err(self.reject(
                ErrorCode::RepeatOp,
                &rep.span,
                "non-greedy repetition not allowed in posix syntax",
            )),
            _ => Ok(()),
        }
    }

    fn visit_class_set_item_pre(
        &mut self,
        item: &ast::ClassSetItem,
    ) -> Result<(), Error> {
        if let ast::ClassSetItem::Perl(ref cls) = *item {
            if !self.opts.get_perl_classes() {
                return Err(self.reject(
                    ErrorCode::BadEscape,
                    &cls.span,
                    "perl character class not allowed in posix syntax",
                ));
            }
        }
        Ok(())
    }
}

/// Removes `\n` from everything the expression can match. A literal that
/// contains `\n` becomes a subexpression that can never match.
fn strip_newline(hir: Hir) -> Hir {
    match hir.into_kind() {
        HirKind::Empty => Hir::empty(),
        HirKind::Literal(hir::Literal(bytes)) => {
            if bytes.contains(&b'\n') {
                Hir::fail()
            } else {
                Hir::literal(bytes)
            }
        }
        HirKind::Class(Class::Unicode(mut cls)) => {
            let nl =
                ClassUnicode::new([ClassUnicodeRange::new('\n', '\n')]);
            cls.difference(&nl);
            if cls.ranges().is_empty() {
                Hir::fail()
            } else {
                Hir::class(Class::Unicode(cls))
            }
        }
        HirKind::Class(Class::Bytes(mut cls)) => {
            let nl = ClassBytes::new([ClassBytesRange::new(b'\n', b'\n')]);
            cls.difference(&nl);
            if cls.ranges().is_empty() {
                Hir::fail()
            } else {
                Hir::class(Class::Bytes(cls))
            }
        }
        HirKind::Look(look) => Hir::look(look),
        HirKind::Repetition(mut rep) => {
            rep.sub = Box::new(strip_newline(*rep.sub));
            Hir::repetition(rep)
        }
        HirKind::Capture(mut cap) => {
            cap.sub = Box::new(strip_newline(*cap.sub));
            Hir::capture(cap)
        }
        HirKind::Concat(subs) => {
            Hir::concat(subs.into_iter().map(strip_newline).collect())
        }
        HirKind::Alternation(subs) => {
            Hir::alternation(subs.into_iter().map(strip_newline).collect())
        }
    }
}

/// Replaces every capture group with its subexpression.
fn decapture(hir: Hir) -> Hir {
    match hir.into_kind() {
        HirKind::Capture(cap) => decapture(*cap.sub),
        HirKind::Repetition(mut rep) => {
            rep.sub = Box::new(decapture(*rep.sub));
            Hir::repetition(rep)
        }
        HirKind::Concat(subs) => {
            Hir::concat(subs.into_iter().map(decapture).collect())
        }
        HirKind::Alternation(subs) => {
            Hir::alternation(subs.into_iter().map(decapture).collect())
        }
        kind => from_kind_leaf(kind),
    }
}

// HirKind has no general "rebuild" constructor, so the leaf kinds are
// reassembled here.
fn from_kind_leaf(kind: HirKind) -> Hir {
    match kind {
        HirKind::Empty => Hir::empty(),
        HirKind::Literal(hir::Literal(bytes)) => Hir::literal(bytes),
        HirKind::Class(cls) => Hir::class(cls),
        HirKind::Look(look) => Hir::look(look),
        _ => unreachable!("only leaf kinds are rebuilt here"),
    }
}
