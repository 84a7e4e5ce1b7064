use super::error::ParseError;


/// Number of substitution passes after which a line is considered to
/// contain a constant that never stops expanding.
pub const MAX_CONSTANT_REPLACE: usize = 10;


/// Constants defined so far in one config file, in definition order.
///
/// Each file read owns its own table; included files start with an empty one
/// and nothing they define is visible to the including file.
#[derive(Clone, Default, Debug)]
pub struct Constants {
    values: Vec<(String, String)>,
}

impl Constants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a `CONSTANT`, keeping the value as written. Redefining a name
    /// replaces its value but keeps its original place in the order.
    pub fn define<N, V>(&mut self, name: N, value: V)
    where
        N: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        let value = value.into();

        match self.values.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing_value)) => *existing_value = value,
            None => self.values.push((name, value)),
        }
    }

    /// Define a `CONSTANT_NOBLANK`, whose value has all whitespace removed
    /// so it can be used inside space-delimited fields.
    pub fn define_noblank<N: Into<String>>(&mut self, name: N, value: &str) {
        let value: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        self.define(name, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replace every occurrence of every constant in `line`, repeating until
    /// the line stops changing so constants may refer to other constants.
    ///
    /// Each pass applies the constants in definition order, so a constant
    /// referring to one defined after it expands within the same pass, while
    /// one referring to an earlier constant needs another pass.
    ///
    /// Fails with [`ParseError::ConstantsTooDeep`] if the line would need
    /// more than [`MAX_CONSTANT_REPLACE`] changing passes to settle.
    pub fn substitute(&self, line: &str) -> Result<String, ParseError> {
        let mut line = line.to_string();
        let mut passes = 0;

        loop {
            let mut replaced = line.clone();
            for (name, value) in &self.values {
                if !name.is_empty() && replaced.contains(name.as_str()) {
                    replaced = replaced.replace(name.as_str(), value);
                }
            }

            if replaced == line {
                return Ok(line);
            }

            passes += 1;
            if passes > MAX_CONSTANT_REPLACE {
                return Err(ParseError::ConstantsTooDeep {
                    limit: MAX_CONSTANT_REPLACE,
                    line,
                });
            }

            line = replaced;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_without_constants_is_unchanged() {
        let mut constants = Constants::new();
        constants.define("ROOT", "/src");

        assert_eq!(constants.substitute("measure Code * *.py").unwrap(), "measure Code * *.py");
        assert_eq!(Constants::new().substitute("ROOT").unwrap(), "ROOT");
    }

    #[test]
    fn constants_are_replaced_everywhere() {
        let mut constants = Constants::new();
        constants.define("EXT", "*.py");

        assert_eq!(
            constants.substitute("measure Code * EXT;test_EXT").unwrap(),
            "measure Code * *.py;test_*.py"
        );
    }

    #[test]
    fn nested_constants_expand_fully() {
        let mut constants = Constants::new();
        constants.define("C_FILES", "*.c;*.h");
        constants.define("ALL_FILES", "C_FILES;*.py");

        assert_eq!(
            constants.substitute("measure NBNC * ALL_FILES").unwrap(),
            "measure NBNC * *.c;*.h;*.py"
        );
    }

    /// Chain `L10 -> L09 -> ... -> L00 -> done`, each constant defined after
    /// the one it refers to, so every link costs one pass.
    fn chain_defined_leaf_first() -> Constants {
        let mut constants = Constants::new();
        constants.define("L00", "done");
        for depth in 1..=10 {
            constants.define(format!("L{depth:02}"), format!("L{:02}", depth - 1));
        }

        constants
    }

    #[test]
    fn chain_within_limit_succeeds() {
        let constants = chain_defined_leaf_first();

        // Ten links.
        assert_eq!(constants.substitute("L09").unwrap(), "done");
    }

    #[test]
    fn chain_beyond_limit_is_too_deep() {
        let constants = chain_defined_leaf_first();

        // Eleven links.
        let error = constants.substitute("L10").unwrap_err();
        assert!(matches!(error, ParseError::ConstantsTooDeep { .. }));
    }

    #[test]
    fn chain_defined_root_first_expands_in_one_pass() {
        let mut constants = Constants::new();
        for depth in (1..=10).rev() {
            constants.define(format!("L{depth:02}"), format!("L{:02}", depth - 1));
        }
        constants.define("L00", "done");

        assert_eq!(constants.substitute("L10").unwrap(), "done");
    }

    #[test]
    fn redefinition_keeps_original_position() {
        let mut constants = Constants::new();
        constants.define("B", "unused");
        constants.define("A", "B");
        constants.define("B", "done");

        // `B` is still applied before `A`, so `A -> B -> done` takes two
        // passes and the result is the new value.
        assert_eq!(constants.len(), 2);
        assert_eq!(constants.substitute("A").unwrap(), "done");
    }

    #[test]
    fn self_referential_constant_is_too_deep() {
        let mut constants = Constants::new();
        constants.define("LOOP", "LOOP+");

        let error = constants.substitute("LOOP").unwrap_err();
        assert!(matches!(
            error,
            ParseError::ConstantsTooDeep { limit: MAX_CONSTANT_REPLACE, .. }
        ));
    }

    #[test]
    fn noblank_constants_drop_whitespace() {
        let mut constants = Constants::new();
        constants.define_noblank("FILES", " *.c ; *.h\t");

        assert_eq!(constants.substitute("measure NBNC * FILES").unwrap(), "measure NBNC * *.c;*.h");
    }

    #[test]
    fn empty_value_removes_the_name() {
        let mut constants = Constants::new();
        constants.define("SUFFIX", "");

        assert!(!constants.is_empty());
        assert_eq!(constants.substitute("*.pySUFFIX").unwrap(), "*.py");
    }
}
