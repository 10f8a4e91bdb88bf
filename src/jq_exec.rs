//! jq selection over raw JSON input, applied before any tree is built.
use anyhow::{Result, anyhow};
use jaq_core::{Compiler, Ctx, Filter, Native, RcIter, compile::Undefined, load};
use jaq_json::Val;
use serde_json::Value;

/// A jq program compiled once and applied to every input document.
pub struct JqSelector {
    source: String,
    filter: Filter<Native<Val>>,
}

impl JqSelector {
    pub fn compile(source: &str) -> Result<Self> {
        let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
        let arena = load::Arena::default();
        let modules = loader
            .load(&arena, load::File { code: source, path: () })
            .map_err(|errors| {
                describe(errors.into_iter().map(|(_, error)| format!("parse error: {error:?}")), source)
            })?;
        let filter = Compiler::default()
            .with_funs(jaq_std::funs().chain(jaq_json::funs()))
            .compile(modules)
            .map_err(|errors| describe(undefined_names(errors), source))?;
        Ok(Self { source: source.to_string(), filter })
    }

    /// Every output of the program for `input`, in order.
    pub fn select(&self, input: &Value) -> Result<Vec<Value>> {
        let inputs = RcIter::new(core::iter::empty());
        let outputs = self
            .filter
            .run((Ctx::new([], &inputs), Val::from(input.clone())))
            .map(|output| output.map(Value::from).map_err(|error| anyhow!("{error:?}")))
            .collect::<Result<Vec<_>>>()?;
        tracing::trace!(filter = %self.source, outputs = outputs.len(), "applied jq filter");
        Ok(outputs)
    }

    /// Selects over each input in turn and concatenates the outputs.
    pub fn select_all<'v>(&self, inputs: impl IntoIterator<Item = &'v Value>) -> Result<Vec<Value>> {
        let mut out = Vec::new();
        for input in inputs {
            out.extend(self.select(input)?);
        }
        Ok(out)
    }
}

fn undefined_names<'s>(
    errors: Vec<(load::File<&'s str, ()>, Vec<(&'s str, Undefined)>)>,
) -> impl Iterator<Item = String> + 's {
    errors
        .into_iter()
        .flat_map(|(_, list)| list)
        .map(|(name, undefined)| format!("undefined `{name}`: {undefined:?}"))
}

fn describe(messages: impl Iterator<Item = String>, source: &str) -> anyhow::Error {
    let messages: Vec<String> = messages.collect();
    anyhow!("{} in jq filter `{source}`", messages.join("; "))
}
