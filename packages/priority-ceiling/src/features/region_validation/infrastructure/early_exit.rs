/// Early-exit detection
///
/// Save/restore pairing assumes one exit per region. A `return` anywhere in
/// a region leaves it; `break`/`continue` leave it unless they target a loop
/// that itself starts inside the innermost region.
use crate::features::region_validation::domain::ControlTransfer;
use crate::shared::models::{
    Diagnostic, DiagnosticKind, Diagnostics, FunctionDecl, Program, SourceLocation, Span, Statement,
};

pub struct EarlyExitChecker {
    file_path: String,
}

#[derive(Clone, Copy)]
struct Scope {
    /// Span of the innermost open region
    region: Option<Span>,
    /// Loops opened since entering that region
    loops_inside: usize,
}

impl EarlyExitChecker {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn check_program(&self, program: &Program) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        for function in &program.functions {
            self.check_function(function, &mut diagnostics);
        }
        diagnostics
    }

    pub fn check_function(&self, function: &FunctionDecl, diagnostics: &mut Diagnostics) {
        let scope = Scope {
            region: None,
            loops_inside: 0,
        };
        self.walk(&function.body, scope, diagnostics);
    }

    fn walk(&self, block: &[Statement], scope: Scope, diagnostics: &mut Diagnostics) {
        for stmt in block {
            match stmt {
                Statement::Critical { body, span } => {
                    let inner = Scope {
                        region: Some(*span),
                        loops_inside: 0,
                    };
                    self.walk(body, inner, diagnostics);
                }
                Statement::Loop { body, .. } => {
                    let inner = Scope {
                        loops_inside: scope.loops_inside + 1,
                        ..scope
                    };
                    self.walk(body, inner, diagnostics);
                }
                Statement::If {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    self.walk(then_branch, scope, diagnostics);
                    self.walk(else_branch, scope, diagnostics);
                }
                Statement::Block { body, .. } => self.walk(body, scope, diagnostics),
                Statement::Return { span } => {
                    if let Some(region) = scope.region {
                        diagnostics.push(self.error(ControlTransfer::Return, *span, region));
                    }
                }
                Statement::Break { span } | Statement::Continue { span } => {
                    let transfer = if matches!(stmt, Statement::Break { .. }) {
                        ControlTransfer::Break
                    } else {
                        ControlTransfer::Continue
                    };
                    if let (Some(region), 0) = (scope.region, scope.loops_inside) {
                        diagnostics.push(self.error(transfer, *span, region));
                    }
                }
                _ => {}
            }
        }
    }

    fn error(&self, transfer: ControlTransfer, at: Span, region: Span) -> Diagnostic {
        let keyword = transfer.keyword();
        let suggestion = match transfer {
            ControlTransfer::Return => {
                "assign the value into a variable inside the critical block and return it after the block ends"
            }
            ControlTransfer::Break | ControlTransfer::Continue => {
                "set a flag inside the critical block and test it after the block ends"
            }
        };
        Diagnostic::new(
            DiagnosticKind::EarlyExitInCriticalRegionError,
            format!(
                "'{}' leaves the critical region opened at line {} before its end; \
                 the saved interrupt state would never be restored",
                keyword, region.start_line
            ),
            SourceLocation::new(&self.file_path, at),
        )
        .with_suggestion(suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(body: Vec<Statement>) -> Diagnostics {
        let mut diags = Diagnostics::new();
        EarlyExitChecker::new("main.cnx").check_function(&FunctionDecl::new("main").with_body(body), &mut diags);
        diags
    }

    #[test]
    fn test_return_in_region_rejected() {
        let diags = check(vec![Statement::critical(vec![Statement::ret().at(Span::line(3))]).at(Span::line(2))]);
        assert_eq!(diags.count_of(DiagnosticKind::EarlyExitInCriticalRegionError), 1);
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.location.span.start_line, 3);
        assert!(diag.message.contains("line 2"));
        assert!(diag.suggestion.as_deref().unwrap_or("").contains("variable"));
    }

    #[test]
    fn test_fall_through_accepted() {
        let diags = check(vec![
            Statement::critical(vec![Statement::write("x"), Statement::other()]),
            Statement::ret(),
        ]);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_break_inside_loop_within_region_accepted() {
        let diags = check(vec![Statement::critical(vec![Statement::looped(vec![
            Statement::if_else(vec![Statement::brk()], vec![Statement::cont()]),
        ])])]);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_break_from_region_inside_loop_rejected() {
        let diags = check(vec![Statement::looped(vec![Statement::critical(vec![
            Statement::if_else(vec![Statement::brk()], vec![]),
            Statement::block(vec![Statement::cont()]),
        ])])]);
        assert_eq!(diags.count_of(DiagnosticKind::EarlyExitInCriticalRegionError), 2);
    }

    #[test]
    fn test_return_inside_loop_in_region_rejected() {
        let diags = check(vec![Statement::critical(vec![Statement::looped(vec![Statement::ret()])])]);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_break_out_of_inner_region_rejected() {
        // loop is inside the outer region but outside the inner one
        let diags = check(vec![Statement::critical(vec![Statement::looped(vec![
            Statement::critical(vec![Statement::brk()]),
        ])])]);
        assert_eq!(diags.len(), 1);
    }
}
