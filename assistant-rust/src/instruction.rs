/// A fragment of a system prompt.
///
/// `When` wraps another fragment behind a guard. Rendering keeps fragment
/// order and drops guarded fragments whose guard is false.
#[derive(Debug, Clone)]
pub enum InstructionParam<TCtx> {
    String(String),
    Func(fn(&TCtx) -> String),
    When(fn(&TCtx) -> bool, Box<InstructionParam<TCtx>>),
}

impl<TCtx> InstructionParam<TCtx> {
    /// Guard `instruction` with `guard`.
    pub fn when(guard: fn(&TCtx) -> bool, instruction: impl Into<Self>) -> Self {
        Self::When(guard, Box::new(instruction.into()))
    }

    /// Render the fragment, `None` when a guard excludes it.
    pub fn render(&self, context: &TCtx) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Func(f) => Some(f(context)),
            Self::When(guard, inner) => {
                if guard(context) {
                    inner.render(context)
                } else {
                    None
                }
            }
        }
    }
}

impl<TCtx> From<&str> for InstructionParam<TCtx> {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl<TCtx> From<String> for InstructionParam<TCtx> {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<TCtx> From<fn(&TCtx) -> String> for InstructionParam<TCtx> {
    fn from(value: fn(&TCtx) -> String) -> Self {
        Self::Func(value)
    }
}

pub fn get_prompt<TCtx>(instructions: &[InstructionParam<TCtx>], context: &TCtx) -> String {
    instructions
        .iter()
        .filter_map(|param| param.render(context))
        .collect::<Vec<_>>()
        .join("\n")
}
