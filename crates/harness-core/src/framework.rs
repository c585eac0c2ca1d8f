use serde::{Deserialize, Serialize};

/// Names the analyzer and generator use to recognise and call into the framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkSpec {
    /// Import path of the framework package.
    pub import_path: String,
    /// Declared package name, used as its alias in generated code.
    pub package_name: String,
    /// Embedding this type makes a struct a controller.
    pub controller_type: String,
    /// Embedding this type makes a struct a test suite.
    pub test_suite_type: String,
    /// Return type of action methods.
    pub result_type: String,
    /// Parameter type that marks a validation receiver.
    pub validation_type: String,
    /// Controller methods whose arguments are bound by name at runtime.
    pub render_methods: Vec<String>,
}

impl Default for FrameworkSpec {
    fn default() -> Self {
        Self {
            import_path: "github.com/robfig/revel".to_string(),
            package_name: "revel".to_string(),
            controller_type: "Controller".to_string(),
            test_suite_type: "TestSuite".to_string(),
            result_type: "Result".to_string(),
            validation_type: "Validation".to_string(),
            render_methods: vec!["Render".to_string()],
        }
    }
}

impl FrameworkSpec {
    pub fn is_render_method(&self, name: &str) -> bool {
        self.render_methods.iter().any(|method| method == name)
    }
}
