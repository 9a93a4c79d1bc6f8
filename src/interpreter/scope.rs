use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use crate::interpreter::ast::ClassDecl;
use crate::interpreter::evaluator::RuntimeError;
use crate::interpreter::value::{Function, TypeTag, Value};

/// Shared handle to a scope. Scopes are kept alive by whoever still needs
/// them: enclosing execution, a function's captured closure environment,
/// or a class instance's field scope.
pub type ScopeRef = Rc<RefCell<Scope>>;

/// A chained namespace of bindings. Variables, functions, classes and
/// declared types live in independent maps; lookups walk outward through
/// the parent chain to the root.
pub struct Scope {
    variables: HashMap<String, Value>,
    functions: HashMap<String, Function>,
    classes: HashMap<String, Rc<ClassDecl>>,
    types: HashMap<String, TypeTag>,
    parent: Option<ScopeRef>,
}

impl Scope {
    pub fn new_root() -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            variables: HashMap::new(),
            functions: HashMap::new(),
            classes: HashMap::new(),
            types: HashMap::new(),
            parent: None,
        }))
    }

    pub fn new_with_parent(parent: ScopeRef) -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            variables: HashMap::new(),
            functions: HashMap::new(),
            classes: HashMap::new(),
            types: HashMap::new(),
            parent: Some(parent),
        }))
    }

    /// Declares a new binding in this scope. Shadowing an outer binding is
    /// fine; redeclaring a name already present in this scope is not.
    pub fn declare_variable(&mut self, name: &str, declared_type: Option<TypeTag>, value: Value) -> Result<(), RuntimeError> {
        if self.variables.contains_key(name) {
            return Err(RuntimeError::VariableAlreadyDeclared(name.to_owned()));
        }

        self.variables.insert(name.to_owned(), value);

        if let Some(tag) = declared_type {
            self.types.insert(name.to_owned(), tag);
        }

        Ok(())
    }

    /// Mutates the nearest enclosing scope that owns the binding. If the
    /// owning declaration carries a type tag, the value must match it.
    pub fn set_variable(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        if self.variables.contains_key(name) {
            if let Some(tag) = self.types.get(name) {
                tag.check(&value)?;
            }

            self.variables.insert(name.to_owned(), value);
            Ok(())
        } else if let Some(parent) = &self.parent {
            parent.borrow_mut().set_variable(name, value)
        } else {
            Err(RuntimeError::UndefinedVariable(name.to_owned()))
        }
    }

    pub fn get_variable(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some(value) = self.variables.get(name) {
            Ok(value.clone())
        } else if let Some(parent) = &self.parent {
            parent.borrow().get_variable(name)
        } else {
            Err(RuntimeError::UndefinedVariable(name.to_owned()))
        }
    }

    pub fn get_type(&self, name: &str) -> Result<TypeTag, RuntimeError> {
        if let Some(tag) = self.types.get(name) {
            Ok(*tag)
        } else if let Some(parent) = &self.parent {
            parent.borrow().get_type(name)
        } else {
            Err(RuntimeError::UndefinedVariable(name.to_owned()))
        }
    }

    /// Non-failing existence probe, used for field-presence checks.
    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
            || self.parent.as_ref().map(|parent| parent.borrow().has_variable(name)).unwrap_or(false)
    }

    pub fn declare_function(&mut self, name: &str, function: Function) -> Result<(), RuntimeError> {
        if self.functions.contains_key(name) {
            return Err(RuntimeError::FunctionAlreadyDefined(name.to_owned()));
        }

        self.functions.insert(name.to_owned(), function);
        Ok(())
    }

    pub fn get_function(&self, name: &str) -> Option<Function> {
        if let Some(function) = self.functions.get(name) {
            Some(function.clone())
        } else if let Some(parent) = &self.parent {
            parent.borrow().get_function(name)
        } else {
            None
        }
    }

    pub fn declare_class(&mut self, name: &str, class: Rc<ClassDecl>) -> Result<(), RuntimeError> {
        if self.classes.contains_key(name) {
            return Err(RuntimeError::ClassAlreadyDefined(name.to_owned()));
        }

        self.classes.insert(name.to_owned(), class);
        Ok(())
    }

    pub fn get_class(&self, name: &str) -> Option<Rc<ClassDecl>> {
        if let Some(class) = self.classes.get(name) {
            Some(Rc::clone(class))
        } else if let Some(parent) = &self.parent {
            parent.borrow().get_class(name)
        } else {
            None
        }
    }
}
