// The translation process is as follows:
// 1. characters, pulled line by line:
pub mod source;
// 2. characters -> tokens
pub mod lexer;
pub mod token;
// 3. tokens -> nodes (type annotations -> types)
pub mod parser;
pub mod types;
// 4. nodes -> values
pub mod node;
