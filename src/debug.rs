//! # Debug Disassembler
//!
//! A tracing aid, not a standalone tool: `disassemble_chunk` dumps an entire
//! chunk, and `disassemble_instruction` (used by both the disassembler and
//! the VM's own `--trace` mode) prints one instruction and returns the
//! offset of the next one.

use crate::chunk::{Chunk, OpCode};

pub fn disassemble_chunk(chunk: &Chunk, name: &str) {
    println!("== {name} ==");
    let mut offset = 0;
    while offset < chunk.code.len() {
        offset = disassemble_instruction(chunk, offset);
    }
}

/// Print one instruction starting at `offset`, returning the offset of the
/// next instruction.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize) -> usize {
    print!("{offset:04} ");
    if offset > 0 && chunk.lines[offset] == chunk.lines[offset - 1] {
        print!("   | ");
    } else {
        print!("{:4} ", chunk.lines[offset]);
    }

    let op = OpCode::from_u8(chunk.code[offset]);
    match op {
        OpCode::Constant => constant_instruction("OpConstant", chunk, offset),
        OpCode::Nil => simple_instruction("OpNil", offset),
        OpCode::True => simple_instruction("OpTrue", offset),
        OpCode::False => simple_instruction("OpFalse", offset),
        OpCode::Pop => simple_instruction("OpPop", offset),
        OpCode::GetLocal => byte_instruction("OpGetLocal", chunk, offset),
        OpCode::SetLocal => byte_instruction("OpSetLocal", chunk, offset),
        OpCode::DefineGlobal => constant_instruction("OpDefineGlobal", chunk, offset),
        OpCode::GetGlobal => constant_instruction("OpGetGlobal", chunk, offset),
        OpCode::SetGlobal => constant_instruction("OpSetGlobal", chunk, offset),
        OpCode::Eq => simple_instruction("OpEqual", offset),
        OpCode::Greater => simple_instruction("OpGreater", offset),
        OpCode::Less => simple_instruction("OpLess", offset),
        OpCode::Add => simple_instruction("OpAdd", offset),
        OpCode::Sub => simple_instruction("OpSubtract", offset),
        OpCode::Mul => simple_instruction("OpMultiply", offset),
        OpCode::Div => simple_instruction("OpDivide", offset),
        OpCode::Not => simple_instruction("OpNot", offset),
        OpCode::Negate => simple_instruction("OpNegate", offset),
        OpCode::Print => simple_instruction("OpPrint", offset),
        OpCode::Jump => jump_instruction("OpJump", 1, chunk, offset),
        OpCode::JumpIfFalse => jump_instruction("OpJumpIfFalse", 1, chunk, offset),
        OpCode::Loop => jump_instruction("OpLoop", -1, chunk, offset),
        OpCode::Call => byte_instruction("OpCall", chunk, offset),
        OpCode::Return => simple_instruction("OpReturn", offset),
    }
}

fn simple_instruction(name: &str, offset: usize) -> usize {
    println!("{name}");
    offset + 1
}

fn constant_instruction(name: &str, chunk: &Chunk, offset: usize) -> usize {
    let constant = chunk.code[offset + 1];
    println!("{name:<16} {constant:4} '{}'", chunk.constants[constant as usize]);
    offset + 2
}

fn byte_instruction(name: &str, chunk: &Chunk, offset: usize) -> usize {
    let slot = chunk.code[offset + 1];
    println!("{name:<16} {slot:4}");
    offset + 2
}

fn jump_instruction(name: &str, sign: i32, chunk: &Chunk, offset: usize) -> usize {
    let jump = u16::from_be_bytes([chunk.code[offset + 1], chunk.code[offset + 2]]) as i32;
    let target = offset as i32 + 3 + sign * jump;
    println!("{name:<16} {offset:4} -> {target}");
    offset + 3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn disassemble_instruction_advances_past_operand_bytes() {
        let mut chunk = Chunk::new();
        let idx = chunk.add_constant(Value::Number(1.0)) as u8;
        chunk.write_op(OpCode::Constant, 1);
        chunk.write(idx, 1);
        chunk.write_op(OpCode::Return, 1);
        let next = disassemble_instruction(&chunk, 0);
        assert_eq!(next, 2);
    }
}
