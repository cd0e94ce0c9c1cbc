use ethereum_types::{H256, U256};
use rollvm_common::{Address, FunctionSelector, Gas};
use rollvm_vm::{
    Environment,
    db::{Bytecode, InMemoryBytecodes},
    errors::CallOutcome,
    gas_cost::{REVERT_BASE, RETURN_BASE, SET_BASE, WORD_COST},
    memory::MemoryTag,
    opcodes::Instruction,
    vm::VM,
};

fn env_for(address: u64) -> Environment {
    Environment::new(
        Address::from_u64(address),
        Address::from_u64(1),
        FunctionSelector::new(0),
        false,
    )
}

fn set(tag: MemoryTag, value: u64, dst: u16) -> Instruction {
    Instruction::Set {
        indirect: 0,
        tag,
        value: U256::from(value),
        dst_offset: dst,
    }
}

fn run_program(program: Vec<Instruction>, gas: Gas, calldata: &[U256]) -> (rollvm_vm::errors::CallResult, usize) {
    let mut store = InMemoryBytecodes::new();
    store.insert(
        Address::from_u64(100),
        Bytecode::new(H256::repeat_byte(0x01), program),
    );
    let mut vm = VM::new(&store);
    let result = vm
        .execute(env_for(100), gas, calldata)
        .expect("no engine defects");
    (result, vm.journal.trace().len())
}

#[test]
fn return_copies_calldata_laid_out_in_memory() {
    let program = vec![Instruction::Return {
        indirect: 0,
        return_offset: 0,
        copy_size: 2,
    }];
    let calldata = [U256::from(5), U256::from(6)];
    let (result, _) = run_program(program, Gas::new(100, 100), &calldata);

    assert_eq!(result.outcome, CallOutcome::Return);
    assert_eq!(result.output, calldata.to_vec());
    assert_eq!(
        result.gas_left,
        Gas::new(100 - RETURN_BASE - 2 * WORD_COST, 100)
    );
}

#[test]
fn nothing_runs_after_a_terminal_instruction() {
    let program = vec![
        Instruction::Return {
            indirect: 0,
            return_offset: 0,
            copy_size: 0,
        },
        set(MemoryTag::Field, 1, 0),
    ];
    let (result, trace_len) = run_program(program, Gas::new(100, 100), &[]);

    assert_eq!(result.outcome, CallOutcome::Return);
    // Only RETURN was charged; the trailing SET never executed.
    assert_eq!(result.gas_left, Gas::new(100 - RETURN_BASE, 100));
    assert_eq!(trace_len, 0);
}

#[test]
fn return_past_populated_memory_faults_before_any_output() {
    let program = vec![Instruction::Return {
        indirect: 0,
        return_offset: 0,
        copy_size: 5,
    }];
    let (result, _) = run_program(program, Gas::new(100, 100), &[]);

    assert_eq!(result.outcome, CallOutcome::Fault);
    assert!(result.output.is_empty());
    assert_eq!(result.gas_left, Gas::ZERO);
    let reason = result.revert_reason.expect("faults carry a reason");
    assert!(reason.message.contains("unset memory"), "{reason}");
}

#[test]
fn revert_size_must_tag_check_as_uint32() {
    let program = vec![
        set(MemoryTag::Field, 3, 1),
        Instruction::Revert {
            indirect: 0,
            return_offset: 0,
            ret_size_offset: 1,
        },
    ];
    let (result, _) = run_program(program, Gas::new(100, 100), &[]);

    assert_eq!(result.outcome, CallOutcome::Fault);
    let reason = result.revert_reason.expect("faults carry a reason");
    assert!(reason.message.contains("tag mismatch"), "{reason}");
}

#[test]
fn top_level_revert_reports_output_and_decoded_reason() {
    let message = "abc";
    let mut program: Vec<Instruction> = message
        .bytes()
        .enumerate()
        .map(|(i, byte)| set(MemoryTag::Field, u64::from(byte), i as u16))
        .collect();
    program.push(set(MemoryTag::Uint32, message.len() as u64, 100));
    program.push(Instruction::Revert {
        indirect: 0,
        return_offset: 0,
        ret_size_offset: 100,
    });
    let (result, _) = run_program(program, Gas::new(200, 100), &[]);

    assert_eq!(result.outcome, CallOutcome::Revert);
    assert_eq!(result.output.len(), 3);
    assert_eq!(
        result.revert_reason.expect("reverts carry a reason").message,
        "abc"
    );
    // A deliberate revert keeps the unconsumed balance.
    assert_eq!(
        result.gas_left,
        Gas::new(200 - 4 * SET_BASE - REVERT_BASE - 3 * WORD_COST, 100)
    );
}

#[test]
fn revert_with_empty_output_still_carries_a_reason() {
    let program = vec![
        set(MemoryTag::Uint32, 0, 0),
        Instruction::Revert {
            indirect: 0,
            return_offset: 10,
            ret_size_offset: 0,
        },
    ];
    let (result, _) = run_program(program, Gas::new(100, 100), &[]);

    assert_eq!(result.outcome, CallOutcome::Revert);
    assert!(result.output.is_empty());
    assert_eq!(
        result.revert_reason.expect("reverts carry a reason").message,
        "reverted without reason data"
    );
}

#[test]
fn return_resolves_indirect_operands() {
    let program = vec![
        set(MemoryTag::Uint32, 7, 0),
        set(MemoryTag::Field, 42, 7),
        Instruction::Return {
            indirect: 0b1,
            return_offset: 0,
            copy_size: 1,
        },
    ];
    let (result, _) = run_program(program, Gas::new(100, 100), &[]);

    assert_eq!(result.outcome, CallOutcome::Return);
    assert_eq!(result.output, vec![U256::from(42)]);
}

#[test]
fn running_off_the_end_of_the_program_faults() {
    let program = vec![set(MemoryTag::Field, 1, 0)];
    let (result, _) = run_program(program, Gas::new(100, 100), &[]);

    assert_eq!(result.outcome, CallOutcome::Fault);
    let reason = result.revert_reason.expect("faults carry a reason");
    assert!(reason.message.contains("invalid program counter"), "{reason}");
}

#[test]
fn out_of_gas_names_the_exhausted_dimension() {
    let program = vec![Instruction::Return {
        indirect: 0,
        return_offset: 0,
        copy_size: 0,
    }];
    let (result, _) = run_program(program, Gas::new(RETURN_BASE - 1, 100), &[]);

    assert_eq!(result.outcome, CallOutcome::Fault);
    let reason = result.revert_reason.expect("faults carry a reason");
    assert!(reason.message.contains("out of l2 gas"), "{reason}");
    assert_eq!(result.gas_left, Gas::ZERO);
}
