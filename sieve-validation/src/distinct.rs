use sieve_core::{Context, Validator};

/// Array without repeated elements.
///
/// Each repeated element is reported at its own index, so the error tree
/// points at the duplicates rather than at the array.
#[derive(Debug, Clone, Copy, Default)]
pub struct Distinct;

impl Validator for Distinct {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        let Some(items) = ctx.value.as_sequence() else {
            return false;
        };
        let repeated: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(i, item)| items[..*i].contains(item))
            .map(|(i, _)| i)
            .collect();
        let distinct = repeated.is_empty();
        for index in repeated {
            ctx.add_element_error(index);
        }
        distinct
    }

    fn name(&self) -> &'static str {
        "distinct"
    }
}
