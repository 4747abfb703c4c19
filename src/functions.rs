//!
//! Registry of vendor-specific SQL functions, keyed by symbolic name.
//!
//! The query layer never spells out backend SQL itself: it looks a function
//! up here by name and splices in the template that was bound against the
//! dialect resolved at configuration build time. Registration happens once
//! during [`Configuration::build`](crate::config::Configuration::build) and
//! the registry is read-only afterwards, shared across all sessions.
//!
use indexmap::IndexMap;

use crate::dialect::Dialect;

/// The scalar type a registered function produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Float64,
    Int64,
}

/// One registered SQL function. `{0}` in the template marks the single
/// argument slot for arity-1 functions.
#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    pub name: &'static str,
    pub template: String,
    pub returns: ReturnKind,
    pub arity: u8,
}

impl FunctionDescriptor {
    /// Render the template with its argument slot filled in.
    pub fn render(&self, arg: Option<&str>) -> String {
        match arg {
            Some(arg) => self.template.replace("{0}", arg),
            None => self.template.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    entries: IndexMap<&'static str, FunctionDescriptor>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        FunctionRegistry::default()
    }

    /// The two built-in functions, bound to the given dialect's templates.
    pub fn standard(dialect: Dialect) -> Self {
        let mut registry = FunctionRegistry::new();
        registry.register(FunctionDescriptor {
            name: "rand",
            template: rand_template(dialect).to_string(),
            returns: ReturnKind::Float64,
            arity: 0,
        });
        registry.register(FunctionDescriptor {
            name: "dice",
            template: dice_template(dialect).to_string(),
            returns: ReturnKind::Int64,
            arity: 1,
        });
        registry
    }

    pub fn register(&mut self, descriptor: FunctionDescriptor) {
        self.entries.insert(descriptor.name, descriptor);
    }

    pub fn lookup(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.entries.get(name)
    }
}

/// Uniform random double in `[0.0, 1.0)`.
///
/// sqlite only has the 64-bit integer `random()`. The mask keeps 53 bits so
/// the integer-to-double conversion is exact; a wider mask rounds values near
/// the top up to the divisor and the quotient hits 1.0.
fn rand_template(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Sqlite => "((random() & 9007199254740991) / 9007199254740992.0)",
        Dialect::H2 | Dialect::MariaDb => "rand()",
        Dialect::Postgres => "random()",
        Dialect::SqlServer => "rand(checksum(newid()))",
    }
}

/// Uniform random integer in the closed range `[0, {0}]`.
fn dice_template(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Sqlite => "((random() & 9223372036854775807) % ({0} + 1))",
        Dialect::H2 | Dialect::MariaDb => "floor(rand() * ({0} + 1))",
        Dialect::Postgres => "floor(random() * ({0} + 1))",
        Dialect::SqlServer => "floor(rand(checksum(newid())) * ({0} + 1))",
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn standard_registry_holds_both_functions() {
        let registry = FunctionRegistry::standard(Dialect::Sqlite);
        let rand = registry.lookup("rand").unwrap();
        assert_eq!(rand.arity, 0);
        assert_eq!(rand.returns, ReturnKind::Float64);
        let dice = registry.lookup("dice").unwrap();
        assert_eq!(dice.arity, 1);
        assert_eq!(dice.returns, ReturnKind::Int64);
        assert!(registry.lookup("coin").is_none());
    }

    #[test]
    fn dice_template_substitutes_bound() {
        let registry = FunctionRegistry::standard(Dialect::MariaDb);
        let dice = registry.lookup("dice").unwrap();
        assert_eq!(dice.render(Some("1000")), "floor(rand() * (1000 + 1))");
        // the bound may itself be a scalar subquery
        let nested = dice.render(Some("(select max(`id`) from message_record)"));
        assert!(nested.contains("(select max(`id`) from message_record) + 1"));
    }

    #[test]
    fn sqlite_rand_never_reaches_one() {
        // evaluate the template the way sqlite does: mask the widest
        // possible random() output, convert to double, divide
        let masked = i64::MAX & 9007199254740991;
        let quotient = masked as f64 / 9007199254740992.0;
        assert!(quotient < 1.0, "{}", quotient);
        assert!(quotient >= 0.0, "{}", quotient);

        let template = FunctionRegistry::standard(Dialect::Sqlite)
            .lookup("rand")
            .unwrap()
            .template
            .clone();
        assert!(template.contains("& 9007199254740991"), "{}", template);
        assert!(template.contains("/ 9007199254740992.0"), "{}", template);
    }

    #[test]
    fn templates_differ_per_dialect() {
        let sqlite = FunctionRegistry::standard(Dialect::Sqlite);
        let postgres = FunctionRegistry::standard(Dialect::Postgres);
        assert_ne!(
            sqlite.lookup("rand").unwrap().template,
            postgres.lookup("rand").unwrap().template
        );
    }
}
