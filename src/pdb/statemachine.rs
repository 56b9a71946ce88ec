//! State machine and async records of decompiled functions.
//!
//! Iterators and async methods compile into a kickoff method, which is what the user wrote, and
//! a `MoveNext` method on a generated class, which holds the IL. A debugger needs the pair to
//! show the kickoff method's name while stepping through `MoveNext`, plus the IL ranges of the
//! locals hoisted into state machine fields and, for async methods, where awaits yield and
//! resume.

use crate::{
    decompiler::FunctionInfo,
    metadata::{
        customdebuginformation::{encode_async_stepping, encode_hoisted_local_scopes, HoistedScope},
        module::ModuleInfo,
        token::Token,
    },
    utils::MAX_COMPRESSED_UINT,
    Result,
};

/// Most hoisted locals whose scopes still fit a single blob
pub const MAX_HOISTED_LOCALS: u32 = MAX_COMPRESSED_UINT / 8;

/// The state machine records a function contributes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateMachineRecords {
    /// `(MoveNext, kickoff)` pair
    pub state_machine: Option<(Token, Token)>,
    /// Hoisted local scopes blob, attached to `MoveNext`
    pub hoisted_scopes: Option<Vec<u8>>,
    /// Async stepping blob and the method it is attached to
    pub async_stepping: Option<(Token, Vec<u8>)>,
}

impl StateMachineRecords {
    /// Build the records of one function
    ///
    /// Every hoisted local gets the range `0..code size of MoveNext`. The stepping information
    /// goes to `MoveNext` when there is one, otherwise to the method itself.
    ///
    /// # Errors
    /// Returns an error if there are more than [`MAX_HOISTED_LOCALS`] hoisted locals or the async
    /// stepping information cannot be encoded.
    pub fn from_function(function: &FunctionInfo, module: &ModuleInfo) -> Result<Self> {
        let mut records = StateMachineRecords::default();

        if let Some(move_next) = function.move_next {
            if function.hoisted_locals > MAX_HOISTED_LOCALS {
                return Err(malformed_error!(
                    "{} hoisted locals exceed the limit of {}",
                    function.hoisted_locals,
                    MAX_HOISTED_LOCALS
                ));
            }
            records.state_machine = Some((move_next, function.method));

            let code_size = module
                .method(move_next)
                .and_then(|method| method.body)
                .map_or(0, |body| body.code_size);
            let scopes = vec![
                HoistedScope {
                    start: 0,
                    length: code_size,
                };
                function.hoisted_locals as usize
            ];
            records.hoisted_scopes = Some(encode_hoisted_local_scopes(&scopes));
        }

        if function.is_async {
            let info = function.async_info.clone().unwrap_or_default();
            let parent = function.body_method();
            records.async_stepping = Some((parent, encode_async_stepping(&info, parent)?));
        }

        Ok(records)
    }

    /// True if the function is neither a state machine nor async
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state_machine.is_none() && self.async_stepping.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        customdebuginformation::{AsyncStepInfo, AwaitPoint},
        module::ModuleInfoBuilder,
    };

    fn module() -> (ModuleInfo, Token, Token) {
        let mut builder = ModuleInfoBuilder::new("App.dll");
        let program = builder.add_type("App", "Program");
        let kickoff = builder.add_method(program, "RunAsync", Some((24, 1)));
        let state_machine = builder.add_nested_type(program, "<RunAsync>d__0");
        let move_next = builder.add_method(state_machine, "MoveNext", Some((0x90, 2)));
        (builder.build(), kickoff, move_next)
    }

    #[test]
    fn plain_function() {
        let (module, kickoff, _) = module();
        let records =
            StateMachineRecords::from_function(&FunctionInfo::new(0, kickoff), &module).unwrap();
        assert!(records.is_empty());
        assert!(records.hoisted_scopes.is_none());
    }

    #[test]
    fn iterator() {
        let (module, kickoff, move_next) = module();
        let mut function = FunctionInfo::new(0, kickoff);
        function.move_next = Some(move_next);
        function.hoisted_locals = 2;

        let records = StateMachineRecords::from_function(&function, &module).unwrap();
        assert_eq!(records.state_machine, Some((move_next, kickoff)));
        assert_eq!(
            records.hoisted_scopes.unwrap(),
            [0, 0, 0, 0, 0x90, 0, 0, 0, 0, 0, 0, 0, 0x90, 0, 0, 0]
        );
        assert!(records.async_stepping.is_none());
    }

    #[test]
    fn async_method() {
        let (module, kickoff, move_next) = module();
        let mut function = FunctionInfo::new(0, kickoff);
        function.move_next = Some(move_next);
        function.is_async = true;
        function.async_info = Some(AsyncStepInfo {
            catch_handler_offset: None,
            awaits: vec![AwaitPoint {
                yield_offset: 0x20,
                resume_offset: 0x38,
                resume_method: move_next,
            }],
        });

        let records = StateMachineRecords::from_function(&function, &module).unwrap();
        let (parent, blob) = records.async_stepping.unwrap();
        assert_eq!(parent, move_next);
        assert_eq!(blob, [0, 0, 0, 0, 0x20, 0, 0, 0, 0x38, 0, 0, 0, 0x02]);
        assert_eq!(records.hoisted_scopes, Some(Vec::new()));
    }

    #[test]
    fn async_without_state_machine() {
        let (module, kickoff, _) = module();
        let mut function = FunctionInfo::new(0, kickoff);
        function.is_async = true;

        let records = StateMachineRecords::from_function(&function, &module).unwrap();
        let (parent, blob) = records.async_stepping.unwrap();
        assert_eq!(parent, kickoff);
        assert_eq!(blob, [0, 0, 0, 0]);
    }

    #[test]
    fn hoisted_locals_are_bounded() {
        let (module, kickoff, move_next) = module();
        let mut function = FunctionInfo::new(0, kickoff);
        function.move_next = Some(move_next);
        function.hoisted_locals = 4_000_000_000;
        assert!(StateMachineRecords::from_function(&function, &module).is_err());

        function.hoisted_locals = MAX_HOISTED_LOCALS + 1;
        assert!(StateMachineRecords::from_function(&function, &module).is_err());

        function.hoisted_locals = 3;
        let records = StateMachineRecords::from_function(&function, &module).unwrap();
        assert_eq!(records.hoisted_scopes.unwrap().len(), 24);
    }
}
