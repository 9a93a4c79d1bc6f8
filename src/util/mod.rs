#[inline]
pub fn is_letter(c: char) -> bool {
    ('a'..='z').contains(&c) || ('A'..='Z').contains(&c)
}

#[inline]
pub fn is_digit(c: char) -> bool {
    ('0'..='9').contains(&c)
}

// Identifiers start with a letter; '_' and digits are only allowed in the tail.
#[inline]
pub fn is_identifier_part(c: char) -> bool {
    is_letter(c) || is_digit(c) || c == '_'
}
