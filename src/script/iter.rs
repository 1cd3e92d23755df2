//! The run loop, and the verification of a whole spend built on it.

use crate::{
    interpreter::{self, cast_to_bool, Element, Program, Stack, TransactionContext},
    script, Operation,
};

/// Runs one operation: the checks that apply wherever it sits, the op count, the handler (on an
/// executing branch), then the stack size limit.
fn step(program: &mut Program, position: usize, op: &Operation) -> Result<(), script::Error> {
    let annotate = |e| script::Error::Interpreter(Some(op.clone()), e);

    op.check(program.flags())?;
    program.ops_increment(op).map_err(annotate)?;
    if program.is_succeess() || op.is_conditional() {
        op.eval(position, program).map_err(annotate)?;
    }
    if program.is_stack_overflow() {
        Err(annotate(interpreter::Error::StackSize(None)))
    } else {
        Ok(())
    }
}

/// Evaluate a single script against `stack`. Any failure abandons the run, and the stacks with
/// it.
pub fn eval(
    code: &script::Code,
    flags: interpreter::Flags,
    transaction: &dyn TransactionContext,
    stack: Stack<Element>,
) -> Result<Stack<Element>, script::Error> {
    // There's a limit on how large scripts can be.
    let size = code.byte_len();
    if size > script::Code::MAX_SIZE {
        return Err(script::Error::ScriptSize(Some(size)));
    }

    let mut program = Program::with_stack(code, transaction, flags, stack);
    code.0
        .iter()
        .enumerate()
        .try_for_each(|(position, op)| step(&mut program, position, op))?;
    if program.is_closed() {
        Ok(program.into_stack())
    } else {
        Err(script::Error::UnclosedConditional(program.open_scopes()))
    }
}

/// Evaluate an entire script.
pub fn eval_script(
    sig: &script::Code,
    pub_key: &script::Code,
    flags: interpreter::Flags,
    transaction: &dyn TransactionContext,
) -> Result<bool, (script::ComponentType, script::Error)> {
    if flags.contains(interpreter::Flags::SigPushOnly) && !sig.is_push_only() {
        return Err((script::ComponentType::Sig, script::Error::SigPushOnly));
    }

    let data_stack = eval(sig, flags, transaction, Stack::new())
        .map_err(|e| (script::ComponentType::Sig, e))?;
    let pub_key_stack = eval(pub_key, flags, transaction, data_stack.clone())
        .map_err(|e| (script::ComponentType::PubKey, e))?;
    if !pub_key_stack.last().is_ok_and(|v| cast_to_bool(v)) {
        return Ok(false);
    }

    let (component, result_stack) = if flags.contains(interpreter::Flags::P2SH)
        && pub_key.is_pay_to_script_hash()
    {
        // script_sig must be literals-only or validation fails
        if !sig.is_push_only() {
            return Err((script::ComponentType::Sig, script::Error::SigPushOnly));
        }
        let redeem_stack = data_stack
            .split_last()
            .map_err(|e| script::Error::Interpreter(None, e))
            .and_then(|(redeem_script, remaining_stack)| {
                script::Code::parse(redeem_script)
                    .and_then(|redeem| eval(&redeem, flags, transaction, remaining_stack))
            })
            .map_err(|e| (script::ComponentType::Redeem, e))?;
        if !redeem_stack.last().is_ok_and(|v| cast_to_bool(v)) {
            return Ok(false);
        }
        (script::ComponentType::Redeem, redeem_stack)
    } else {
        (script::ComponentType::PubKey, pub_key_stack)
    };

    // The CLEANSTACK check is only performed after potential P2SH evaluation, as the non-P2SH
    // evaluation of a P2SH script will obviously not result in a clean stack (the P2SH inputs
    // remain). It has no effect without P2SH.
    if flags.contains(interpreter::Flags::CleanStack | interpreter::Flags::P2SH)
        && result_stack.len() != 1
    {
        Err((component, script::Error::CleanStack))
    } else {
        Ok(true)
    }
}
