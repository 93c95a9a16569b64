//! Walks term trees and lowers them into a flat memory image: constants and
//! strings accumulate in a data-memory array, instructions in a code-memory
//! array, and the two are concatenated once every address is known.

use crate::error::{Error, Result, TermError};
use crate::lexer::Term;
use crate::symbols::{LiteralKey, SymbolTable};
use accvm::constants::{MAX_OPERAND, MEMORY_SIZE};
use accvm::isa::{encode, AddressingMode, Opcode};
use accvm::{Address, Memory, Word};

fn is_digit_atom(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn is_bool_literal(s: &str) -> bool {
    s == "T" || s == "F"
}

fn is_string_literal(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'')
}

fn unquote(s: &str) -> &str {
    &s[1..s.len() - 1]
}

/// Lowers a sequence of top-level terms into a complete, relocated memory
/// image.
pub struct Translator {
    code_memory: Vec<Word>,
    data_memory: Vec<Word>,
    symbols: SymbolTable,
}

impl Translator {
    pub fn new() -> Translator {
        Translator {
            code_memory: Vec::new(),
            data_memory: vec![0],
            symbols: SymbolTable::default(),
        }
    }

    fn pc(&self) -> Address {
        self.code_memory.len() as Address
    }

    fn add_command(&mut self, opcode: Opcode, mode: AddressingMode, operand: u32) -> Address {
        let pc = self.pc();
        self.code_memory.push(encode(opcode, mode, operand));
        pc
    }

    fn add_placeholder(&mut self) -> Address {
        let pc = self.pc();
        self.code_memory.push(0);
        pc
    }

    fn patch(&mut self, at: Address, opcode: Opcode, mode: AddressingMode, operand: u32) {
        self.code_memory[at as usize] = encode(opcode, mode, operand);
    }

    fn add_data(&mut self, value: u32) -> Address {
        let addr = self.data_memory.len() as Address;
        self.data_memory.push(value);
        addr
    }

    fn add_data_block(&mut self, value: u32, count: u32) -> Address {
        let addr = self.data_memory.len() as Address;
        self.data_memory.extend(std::iter::repeat(value).take(count as usize));
        addr
    }

    /// A local with the same name as a global shadows it, so the frame is
    /// consulted before the global table.
    fn operation_with_var(
        &mut self,
        term: &Term,
        opcode: Opcode,
        var_name: &str,
        fun_name: Option<&str>,
    ) -> Result<()> {
        if let Some(fname) = fun_name {
            if let Some(offset) = self
                .symbols
                .fun_variables
                .get(fname)
                .and_then(|frame| frame.iter().position(|n| n == var_name))
            {
                self.add_command(opcode, AddressingMode::SpIndirect, offset as u32);
                return Ok(());
            }
        }

        if let Some(&addr) = self.symbols.variables.get(var_name) {
            self.add_command(opcode, AddressingMode::Direct, addr);
            return Ok(());
        }

        Err(TermError::new(term, format!("no such variable: {}", var_name)).into())
    }

    fn operation_with_num_literal(&mut self, term: &Term, opcode: Opcode, value: u128) -> Result<()> {
        if value <= MAX_OPERAND as u128 {
            self.add_command(opcode, AddressingMode::OperandLoad, value as u32);
        } else if value <= u32::MAX as u128 {
            let key = LiteralKey::Int(value as u64);
            let addr = match self.symbols.literals.get(&key) {
                Some(&addr) => addr,
                None => {
                    let addr = self.add_data(value as u32);
                    self.symbols.literals.insert(key, addr);
                    addr
                }
            };
            self.add_command(opcode, AddressingMode::Direct, addr);
        } else {
            return Err(TermError::new(term, "numbers above 2^32 - 1 are not allowed").into());
        }
        Ok(())
    }

    fn operation_with_bool_literal(&mut self, opcode: Opcode, is_true: bool) {
        self.add_command(opcode, AddressingMode::OperandLoad, if is_true { 1 } else { 0 });
    }

    fn get_string_literal_addr(&mut self, s: &str) -> Address {
        let key = LiteralKey::Str(s.to_owned());
        if let Some(&addr) = self.symbols.literals.get(&key) {
            return addr;
        }

        let addr = self.data_memory.len() as Address;
        self.symbols.literals.insert(key, addr);
        for c in s.chars() {
            self.add_data(c as u32);
        }
        self.add_data(0);
        addr
    }

    /// Lowers a value into ACC: a nested expression recurses, a digit string
    /// or boolean literal loads an immediate, anything else is a variable
    /// reference.
    fn lower_value(&mut self, term: &Term, value: &Term, fun_name: Option<&str>) -> Result<()> {
        match value {
            Term::List(_) => self.translate_term(value, fun_name),
            Term::Atom(a) if is_digit_atom(a) => {
                let n: u128 = a
                    .parse()
                    .map_err(|_| TermError::new(term, "number too large"))?;
                self.operation_with_num_literal(term, Opcode::Load, n)
            }
            Term::Atom(a) if is_bool_literal(a) => {
                self.operation_with_bool_literal(Opcode::Load, a == "T");
                Ok(())
            }
            Term::Atom(a) => self.operation_with_var(term, Opcode::Load, a, fun_name),
        }
    }

    /// Lowers a value directly into an instruction's addressing-mode
    /// operand (a digit literal or a variable), for positions that can't
    /// take an arbitrary computed value, only a literal or a memory
    /// reference.
    fn emit_operand(
        &mut self,
        term: &Term,
        opcode: Opcode,
        value: &Term,
        fun_name: Option<&str>,
    ) -> Result<()> {
        match value {
            Term::Atom(a) if is_digit_atom(a) => {
                let n: u128 = a
                    .parse()
                    .map_err(|_| TermError::new(term, "number too large"))?;
                self.operation_with_num_literal(term, opcode, n)
            }
            Term::Atom(a) => self.operation_with_var(term, opcode, a, fun_name),
            Term::List(_) => Err(TermError::new(
                term,
                "expected a literal or a variable here, not a nested expression",
            )
            .into()),
        }
    }

    fn translate_fun(&mut self, items: &[Term], term: &Term) -> Result<()> {
        let name = items[1]
            .as_atom()
            .ok_or_else(|| TermError::new(term, "function name must be an atom"))?
            .to_owned();
        let arg_items = items[2]
            .as_list()
            .ok_or_else(|| TermError::new(term, "function parameter list must be a list"))?;
        let mut arg_names: Vec<String> = Vec::with_capacity(arg_items.len());
        for a in arg_items {
            arg_names.push(
                a.as_atom()
                    .ok_or_else(|| TermError::new(term, "parameter names must be atoms"))?
                    .to_owned(),
            );
        }

        let jmp_pc = self.add_placeholder();

        self.symbols.functions.insert(name.clone(), self.pc());

        arg_names.push(String::new());
        arg_names.reverse();
        self.symbols.fun_variables.insert(name.clone(), arg_names);

        for expr in &items[3..] {
            match expr {
                Term::List(_) => self.translate_term(expr, Some(&name))?,
                Term::Atom(a) => self.operation_with_var(term, Opcode::Load, a, Some(&name))?,
            }
        }

        let frame = self.symbols.fun_variables.get(&name).cloned().unwrap_or_default();
        for slot in &frame {
            if slot.is_empty() {
                break;
            }
            self.add_command(Opcode::Pop, AddressingMode::Direct, 0);
        }

        self.add_command(Opcode::Return, AddressingMode::Direct, 0);
        let entry = self.pc();
        self.patch(jmp_pc, Opcode::Jmp, AddressingMode::Direct, entry);
        Ok(())
    }

    fn translate_fun_call(&mut self, items: &[Term], term: &Term, fun_name: Option<&str>) -> Result<()> {
        let name = items[0].as_atom().expect("call head is an atom");
        let args = &items[1..];

        for arg in args {
            self.lower_value(term, arg, fun_name)?;
            self.add_command(Opcode::Push, AddressingMode::Direct, 0);
        }

        let fun_addr = *self
            .symbols
            .functions
            .get(name)
            .ok_or_else(|| TermError::new(term, format!("no such function: {}", name)))?;
        self.add_command(Opcode::Call, AddressingMode::Direct, fun_addr);

        for _ in args {
            self.add_command(Opcode::Pop, AddressingMode::Direct, 0);
        }
        Ok(())
    }

    fn translate_action(&mut self, term: &Term, action: &Term, fun_name: Option<&str>) -> Result<()> {
        match action {
            Term::Atom(a) if is_string_literal(a) => {
                let addr = self.get_string_literal_addr(unquote(a));
                self.add_command(Opcode::Load, AddressingMode::OperandLoad, addr);
                Ok(())
            }
            _ => self.lower_value(term, action, fun_name),
        }
    }

    fn translate_if(&mut self, items: &[Term], term: &Term, fun_name: Option<&str>) -> Result<()> {
        let condition = &items[1];
        let if_true = &items[2];
        let if_false = items.get(3);

        self.lower_value(term, condition, fun_name)?;

        let jz_pc = self.add_placeholder();
        self.translate_action(term, if_true, fun_name)?;

        if let Some(if_false) = if_false {
            let jmp_pc = self.add_placeholder();
            let else_pc = self.pc();
            self.patch(jz_pc, Opcode::Jz, AddressingMode::Direct, else_pc);

            self.translate_action(term, if_false, fun_name)?;
            let end_pc = self.pc();
            self.patch(jmp_pc, Opcode::Jmp, AddressingMode::Direct, end_pc);
        } else {
            let end_pc = self.pc();
            self.patch(jz_pc, Opcode::Jz, AddressingMode::Direct, end_pc);
        }
        Ok(())
    }

    fn translate_while(&mut self, items: &[Term], term: &Term, fun_name: Option<&str>) -> Result<()> {
        let condition = &items[1];
        let body = &items[2..];

        let condition_pc = self.pc();
        self.lower_value(term, condition, fun_name)?;

        let jz_pc = self.add_placeholder();
        for act in body {
            self.lower_value(term, act, fun_name)?;
        }

        self.add_command(Opcode::Jmp, AddressingMode::Direct, condition_pc);
        let end_pc = self.pc();
        self.patch(jz_pc, Opcode::Jz, AddressingMode::Direct, end_pc);
        Ok(())
    }

    /// Resolves (or allocates) storage for `var_name`, returning its address
    /// and whether it was just pushed fresh onto the current frame (in
    /// which case its value is already the pushed ACC and needs no
    /// explicit `SAVE`).
    fn get_var_address(&mut self, var_name: &str, fun_name: Option<&str>) -> (Address, bool) {
        if let Some(fname) = fun_name {
            if let Some(offset) = self
                .symbols
                .fun_variables
                .get(fname)
                .and_then(|frame| frame.iter().position(|n| n == var_name))
            {
                return (offset as Address, false);
            }

            if let Some(frame) = self.symbols.fun_variables.get_mut(fname) {
                frame.insert(0, var_name.to_owned());
            }
            self.add_command(Opcode::Push, AddressingMode::Direct, 0);
            return (0, true);
        }

        if let Some(&addr) = self.symbols.variables.get(var_name) {
            return (addr, false);
        }

        let addr = self.add_data(0);
        self.symbols.variables.insert(var_name.to_owned(), addr);
        (addr, false)
    }

    fn translate_set(&mut self, items: &[Term], term: &Term, fun_name: Option<&str>) -> Result<()> {
        let var_name = items[1]
            .as_atom()
            .ok_or_else(|| TermError::new(term, "variable name must be an atom"))?
            .to_owned();
        let var_value = &items[2];

        self.lower_value(term, var_value, fun_name)?;

        let (addr, is_pushed) = self.get_var_address(&var_name, fun_name);

        if fun_name.is_some() {
            if !is_pushed {
                self.add_command(Opcode::Save, AddressingMode::SpIndirect, addr);
            }
        } else {
            self.add_command(Opcode::Save, AddressingMode::Direct, addr);
        }
        Ok(())
    }

    fn translate_set_char(&mut self, items: &[Term], term: &Term, fun_name: Option<&str>) -> Result<()> {
        let string_name = items[1].as_atom().ok_or_else(|| TermError::new(term, "string name must be an atom"))?;
        let pos = &items[2];
        let char_val = &items[3];

        let (string_addr, _) = *self
            .symbols
            .string_arrays
            .get(string_name)
            .ok_or_else(|| TermError::new(term, format!("no such string name: {}", string_name)))?;

        let new_char_addr = self.add_data(0);

        self.add_command(Opcode::Load, AddressingMode::OperandLoad, string_addr);
        self.emit_operand(term, Opcode::Add, pos, fun_name)?;
        self.add_command(Opcode::Save, AddressingMode::Direct, new_char_addr);

        self.lower_value(term, char_val, fun_name)?;
        self.add_command(Opcode::Save, AddressingMode::Indirect, new_char_addr);
        Ok(())
    }

    fn translate_print_string(&mut self, items: &[Term], term: &Term) -> Result<()> {
        let string = &items[1];
        let string_addr_addr = self.add_data(0);

        match string {
            Term::Atom(a) if is_string_literal(a) => {
                let addr = self.get_string_literal_addr(unquote(a));
                self.add_command(Opcode::Load, AddressingMode::OperandLoad, addr);
            }
            Term::List(_) => self.translate_term(string, None)?,
            Term::Atom(a) => {
                let (addr, _) = *self
                    .symbols
                    .string_arrays
                    .get(a.as_str())
                    .ok_or_else(|| TermError::new(term, format!("no such string name: {}", a)))?;
                self.add_command(Opcode::Load, AddressingMode::OperandLoad, addr);
            }
        }

        self.add_command(Opcode::Save, AddressingMode::Direct, string_addr_addr);

        let loop_start = self.pc();
        self.add_command(Opcode::Load, AddressingMode::Indirect, string_addr_addr);
        let jz_pc = self.add_placeholder();
        self.add_command(Opcode::Print, AddressingMode::Direct, 0);

        self.add_command(Opcode::Load, AddressingMode::Direct, string_addr_addr);
        self.add_command(Opcode::Add, AddressingMode::OperandLoad, 1);
        self.add_command(Opcode::Save, AddressingMode::Direct, string_addr_addr);

        self.add_command(Opcode::Jmp, AddressingMode::Direct, loop_start);
        let after_loop = self.pc();
        self.patch(jz_pc, Opcode::Jz, AddressingMode::Direct, after_loop);
        Ok(())
    }

    fn print_int_buffer(&mut self) -> Address {
        if let Some(&(addr, _)) = self.symbols.string_arrays.get("print-int") {
            return addr + 11;
        }
        let buffer_addr = self.add_data_block(0, 11);
        self.symbols.string_arrays.insert("print-int".to_owned(), (buffer_addr, 11));
        self.add_data(buffer_addr + 1);
        buffer_addr + 11
    }

    fn translate_print_int(&mut self, items: &[Term], term: &Term, fun_name: Option<&str>) -> Result<()> {
        let arg = &items[1];
        let tail_cell = self.print_int_buffer();

        self.lower_value(term, arg, fun_name)?;
        self.add_command(Opcode::Push, AddressingMode::Direct, 0);

        let extract_start = self.pc();
        self.add_command(Opcode::Load, AddressingMode::SpIndirect, 0);
        self.add_command(Opcode::Mod, AddressingMode::OperandLoad, 10);
        self.add_command(Opcode::Add, AddressingMode::OperandLoad, b'0' as u32);
        self.add_command(Opcode::Save, AddressingMode::Indirect, tail_cell);

        self.add_command(Opcode::Load, AddressingMode::SpIndirect, 0);
        self.add_command(Opcode::Div, AddressingMode::OperandLoad, 10);
        let exhausted_jz = self.add_placeholder();
        self.add_command(Opcode::Save, AddressingMode::SpIndirect, 0);

        self.add_command(Opcode::Load, AddressingMode::Direct, tail_cell);
        self.add_command(Opcode::Add, AddressingMode::OperandLoad, 1);
        self.add_command(Opcode::Save, AddressingMode::Direct, tail_cell);

        self.add_command(Opcode::Jmp, AddressingMode::Direct, extract_start);
        let after_extract = self.pc();
        self.patch(exhausted_jz, Opcode::Jz, AddressingMode::Direct, after_extract);
        self.add_command(Opcode::Pop, AddressingMode::Direct, 0);

        let print_start = self.pc();
        self.add_command(Opcode::Load, AddressingMode::Indirect, tail_cell);
        let done_jz = self.add_placeholder();
        self.add_command(Opcode::Print, AddressingMode::Direct, 0);

        self.add_command(Opcode::Load, AddressingMode::Direct, tail_cell);
        self.add_command(Opcode::Sub, AddressingMode::OperandLoad, 1);
        self.add_command(Opcode::Save, AddressingMode::Direct, tail_cell);

        self.add_command(Opcode::Jmp, AddressingMode::Direct, print_start);
        let after_print = self.pc();
        self.patch(done_jz, Opcode::Jz, AddressingMode::Direct, after_print);

        self.add_command(Opcode::Load, AddressingMode::Direct, tail_cell);
        self.add_command(Opcode::Add, AddressingMode::OperandLoad, 1);
        self.add_command(Opcode::Save, AddressingMode::Direct, tail_cell);
        Ok(())
    }

    fn translate_print_char(&mut self, items: &[Term], term: &Term, fun_name: Option<&str>) -> Result<()> {
        self.lower_value(term, &items[1], fun_name)?;
        self.add_command(Opcode::Print, AddressingMode::Direct, 0);
        Ok(())
    }

    fn translate_read_char(&mut self) {
        self.add_command(Opcode::Input, AddressingMode::Direct, 0);
    }

    fn translate_alloc(&mut self, items: &[Term], term: &Term) -> Result<()> {
        let string_name = items[1]
            .as_atom()
            .ok_or_else(|| TermError::new(term, "buffer name must be an atom"))?
            .to_owned();
        let size_atom = items[2]
            .as_atom()
            .ok_or_else(|| TermError::new(term, "buffer size must be a number"))?;
        if !is_digit_atom(size_atom) {
            return Err(TermError::new(term, "buffer size must be a number").into());
        }
        let size: u32 = size_atom.parse().map_err(|_| TermError::new(term, "buffer size too large"))? ;
        let size = size + 1;

        let addr = self.add_data_block(0, size);
        self.symbols.string_arrays.insert(string_name, (addr, size));
        Ok(())
    }

    fn translate_comparison_symbol(&mut self, items: &[Term], term: &Term, fun_name: Option<&str>) -> Result<()> {
        let op = items[0].as_atom().expect("comparison head is an atom");
        let arg1 = &items[1];
        let arg2 = &items[2];

        self.lower_value(term, arg1, fun_name)?;
        self.emit_operand(term, Opcode::Cmp, arg2, fun_name)?;

        let (match_value, mismatch_value) = if op == "=" { (0u32, 1u32) } else { (1u32, 0u32) };

        let jz_pc = self.add_placeholder();
        self.add_command(Opcode::Load, AddressingMode::OperandLoad, match_value);
        let jmp_pc = self.add_placeholder();
        let mismatch_pc = self.pc();
        self.patch(jz_pc, Opcode::Jz, AddressingMode::Direct, mismatch_pc);
        self.add_command(Opcode::Load, AddressingMode::OperandLoad, mismatch_value);
        let end_pc = self.pc();
        self.patch(jmp_pc, Opcode::Jmp, AddressingMode::Direct, end_pc);
        Ok(())
    }

    fn translate_arithmetic_symbol(&mut self, items: &[Term], term: &Term, fun_name: Option<&str>) -> Result<()> {
        let op = items[0].as_atom().expect("arithmetic head is an atom");
        let opcode = match op {
            "+" => Opcode::Add,
            "-" => Opcode::Sub,
            "%" => Opcode::Mod,
            _ => return Err(TermError::new(term, format!("unsupported arithmetic operator: {}", op)).into()),
        };

        self.lower_value(term, &items[1], fun_name)?;
        self.emit_operand(term, opcode, &items[2], fun_name)?;
        Ok(())
    }

    fn translate_ampersand(&mut self, items: &[Term], term: &Term, fun_name: Option<&str>) -> Result<()> {
        self.lower_value(term, &items[1], fun_name)?;
        self.add_command(Opcode::Push, AddressingMode::Direct, 0);

        self.lower_value(term, &items[2], fun_name)?;
        self.add_command(Opcode::Cmp, AddressingMode::SpIndirect, 0);

        let jz_pc = self.add_placeholder();
        self.add_command(Opcode::Load, AddressingMode::OperandLoad, 0);
        let jmp_pc = self.add_placeholder();
        let mismatch_pc = self.pc();
        self.patch(jz_pc, Opcode::Jz, AddressingMode::Direct, mismatch_pc);
        self.add_command(Opcode::Load, AddressingMode::OperandLoad, 1);
        let end_pc = self.pc();
        self.patch(jmp_pc, Opcode::Jmp, AddressingMode::Direct, end_pc);

        self.add_command(Opcode::Pop, AddressingMode::Direct, 0);
        Ok(())
    }

    fn translate_term(&mut self, term: &Term, fun_name: Option<&str>) -> Result<()> {
        let items = term
            .as_list()
            .ok_or_else(|| TermError::new(term, "expected a parenthesised term"))?;
        let head = items[0].as_atom().ok_or_else(|| TermError::new(term, "term head must be an atom"))?;

        match head {
            "fun" => {
                if fun_name.is_some() {
                    return Err(TermError::new(term, "functions cannot be nested").into());
                }
                self.translate_fun(items, term)
            }
            _ if self.symbols.functions.contains_key(head) => self.translate_fun_call(items, term, fun_name),
            "if" => self.translate_if(items, term, fun_name),
            "while" => self.translate_while(items, term, fun_name),
            "set" => self.translate_set(items, term, fun_name),
            "set_char" => self.translate_set_char(items, term, fun_name),
            "print_string" => self.translate_print_string(items, term),
            "print_char" => self.translate_print_char(items, term, fun_name),
            "print_int" => self.translate_print_int(items, term, fun_name),
            "read_char" => {
                self.translate_read_char();
                Ok(())
            }
            "alloc" => self.translate_alloc(items, term),
            "=" | "!=" => self.translate_comparison_symbol(items, term, fun_name),
            "&" => self.translate_ampersand(items, term, fun_name),
            "+" | "-" | "%" => self.translate_arithmetic_symbol(items, term, fun_name),
            _ => Err(TermError::new(term, format!("invalid keyword: {}", head)).into()),
        }
    }

    /// Translates every term, relocates control-flow operands, and emits
    /// the final 2048-cell memory image.
    pub fn translate(mut self, terms: &[Term]) -> Result<Memory> {
        for term in terms {
            self.translate_term(term, None)?;
        }

        let data_len = self.data_memory.len() as u32;
        self.data_memory[0] = encode(Opcode::Jmp, AddressingMode::Direct, data_len);

        for word in self.code_memory.iter_mut() {
            if let Ok(decoded) = accvm::isa::decode(*word) {
                if decoded.opcode.is_control_flow() {
                    *word = encode(decoded.opcode, decoded.mode, decoded.operand + data_len);
                }
            }
        }

        self.add_command(Opcode::Hlt, AddressingMode::Direct, 0);

        let mut cells = self.data_memory;
        cells.extend(self.code_memory);
        cells.resize(MEMORY_SIZE as usize, 0);
        Ok(Memory::from(cells))
    }
}

impl Default for Translator {
    fn default() -> Translator {
        Translator::new()
    }
}
