//! Test data builders

use priority_ceiling::config::{AnalysisConfig, TargetPreset};
use priority_ceiling::features::context_model::ContextDecl;
use priority_ceiling::pipeline::{ConcurrencyVerifier, VerificationFailure, VerifiedProgram};
use priority_ceiling::shared::models::{CallEdge, FunctionDecl, Program, ResourceDecl, Statement};

/// Builder for a program plus its context table
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    program: Program,
    contexts: Vec<ContextDecl>,
}

impl ScenarioBuilder {
    /// Program with a main context at priority 0
    pub fn new() -> Self {
        Self {
            program: Program::new("main.cnx"),
            contexts: vec![ContextDecl::main()],
        }
    }

    /// Add an interrupt context whose handler is the function of the same name
    pub fn interrupt(mut self, name: &str, priority: u32) -> Self {
        self.contexts.push(ContextDecl::interrupt(name, priority));
        self
    }

    pub fn region_scoped(mut self, name: &str) -> Self {
        self.program = self.program.with_resource(ResourceDecl::region_scoped(name));
        self
    }

    pub fn atomic(mut self, name: &str) -> Self {
        self.program = self.program.with_resource(ResourceDecl::atomic(name));
        self
    }

    pub fn resource(mut self, decl: ResourceDecl) -> Self {
        self.program = self.program.with_resource(decl);
        self
    }

    pub fn function(mut self, name: &str, body: Vec<Statement>) -> Self {
        self.program = self.program.with_function(FunctionDecl::new(name).with_body(body));
        self
    }

    pub fn function_decl(mut self, decl: FunctionDecl) -> Self {
        self.program = self.program.with_function(decl);
        self
    }

    /// Front-end call edge with no matching call statement
    pub fn call_edge(mut self, caller: &str, callee: &str) -> Self {
        self.program = self.program.with_call_edge(CallEdge::new(caller, callee));
        self
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn contexts(&self) -> Vec<ContextDecl> {
        self.contexts.clone()
    }

    pub fn verify_with(&self, config: AnalysisConfig) -> Result<VerifiedProgram, VerificationFailure> {
        ConcurrencyVerifier::new(config).verify(&self.program, self.contexts.clone())
    }

    pub fn verify(&self, preset: TargetPreset) -> Result<VerifiedProgram, VerificationFailure> {
        self.verify_with(AnalysisConfig::preset(preset))
    }
}

/// `critical { <resource> <- ... }`
pub fn guarded_write(resource: &str) -> Statement {
    Statement::critical(vec![Statement::write(resource)])
}
