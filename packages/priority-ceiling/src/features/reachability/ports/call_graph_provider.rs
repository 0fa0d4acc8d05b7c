//! Read-only view of a static call graph

/// Call graph as seen by the analysis stages
///
/// Names only; indirect call sites are tracked separately by the
/// concrete graph since they have no resolved callee.
pub trait CallGraphProvider {
    /// Direct callees of `func_name`, deduplicated
    fn get_callees(&self, func_name: &str) -> Vec<String>;

    /// Every function node, defined in the program or merely called
    fn get_functions(&self) -> Vec<String>;

    /// Direct callers of `func_name`
    fn get_callers(&self, _func_name: &str) -> Vec<String> {
        Vec::new()
    }

    fn contains_function(&self, func_name: &str) -> bool {
        self.get_functions().iter().any(|f| f == func_name)
    }

    fn num_functions(&self) -> usize {
        self.get_functions().len()
    }
}
