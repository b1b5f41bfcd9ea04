/*!
Simplified DES block cipher.

An 8-bit block, 10-bit key Feistel cipher with two rounds. Every unit of a
message is transformed on its own: there is no chaining, padding or IV, so a
message and its ciphertext always have the same length.

This is a teaching cipher. It offers no real confidentiality and exists so
that both ends of the protocol agree bit for bit.
*/

use crate::core::constants::keys::{DEFAULT_CIPHER_KEY, SESSION_KEY_MASK};

/// The two 8-bit round keys derived from a 10-bit master key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubkeyPair {
    /// Round key for the first encryption round
    pub key1: u8,
    /// Round key for the second encryption round
    pub key2: u8,
}

/// Block cipher over 8-bit units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockCipher {
    /// 10-bit master key
    key: u16,
    /// Derived round keys
    subkeys: SubkeyPair,
}

impl BlockCipher {
    /// Key schedule permutation over 10 bit positions (1 = most significant)
    pub const P10: [u8; 10] = [3, 5, 2, 7, 4, 10, 1, 9, 8, 6];

    /// Compression permutation selecting 8 of 10 positions
    pub const P8: [u8; 8] = [6, 3, 7, 4, 8, 5, 10, 9];

    /// Initial permutation
    pub const IP: [u8; 8] = [2, 6, 3, 1, 4, 8, 5, 7];

    /// Inverse of the initial permutation
    pub const IP_INVERSE: [u8; 8] = [4, 1, 3, 5, 7, 2, 8, 6];

    /// Expansion of a 4-bit half to 8 bits
    pub const EXPANSION: [u8; 8] = [4, 1, 2, 3, 2, 3, 4, 1];

    /// Permutation of the concatenated S-box outputs
    pub const P4: [u8; 4] = [2, 4, 3, 1];

    /// Substitution box for the left group, indexed `[row][column]`
    pub const S0: [[u8; 4]; 4] = [
        [1, 0, 3, 2],
        [3, 2, 1, 0],
        [0, 2, 1, 3],
        [3, 1, 3, 2],
    ];

    /// Substitution box for the right group, indexed `[row][column]`
    pub const S1: [[u8; 4]; 4] = [
        [0, 1, 2, 3],
        [2, 0, 1, 3],
        [3, 0, 1, 0],
        [2, 1, 0, 3],
    ];

    /// Create a cipher keyed with the low ten bits of `key`.
    pub fn new(key: u16) -> Self {
        let key = key & SESSION_KEY_MASK;
        Self {
            key,
            subkeys: Self::generate_subkeys(key),
        }
    }

    /// The 10-bit master key
    pub fn key(&self) -> u16 {
        self.key
    }

    /// The derived round keys
    pub fn subkeys(&self) -> SubkeyPair {
        self.subkeys
    }

    /// Derive both round keys from a 10-bit key.
    pub fn generate_subkeys(key: u16) -> SubkeyPair {
        let permuted = permute(u32::from(key), &Self::P10, 10);
        let mut left = (permuted >> 5) & 0x1F;
        let mut right = permuted & 0x1F;

        left = rotate_left_5(left);
        right = rotate_left_5(right);
        let key1 = permute((left << 5) | right, &Self::P8, 10) as u8;

        left = rotate_left_5(left);
        right = rotate_left_5(right);
        let key2 = permute((left << 5) | right, &Self::P8, 10) as u8;

        SubkeyPair { key1, key2 }
    }

    /// Round function: mixes a 4-bit half with an 8-bit round key.
    pub fn feistel(data: u8, subkey: u8) -> u8 {
        let mixed = permute(u32::from(data & 0x0F), &Self::EXPANSION, 4) as u8 ^ subkey;

        let (row, col) = sbox_index(mixed >> 4);
        let left = Self::S0[row][col];

        let (row, col) = sbox_index(mixed & 0x0F);
        let right = Self::S1[row][col];

        permute(u32::from((left << 2) | right), &Self::P4, 4) as u8
    }

    /// Encrypt a single unit.
    pub fn encrypt_unit(&self, plain: u8) -> u8 {
        self.rounds(plain, self.subkeys.key1, self.subkeys.key2)
    }

    /// Decrypt a single unit.
    pub fn decrypt_unit(&self, cipher: u8) -> u8 {
        self.rounds(cipher, self.subkeys.key2, self.subkeys.key1)
    }

    /// Encrypt every unit of `plaintext`, in order.
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        plaintext.iter().map(|&unit| self.encrypt_unit(unit)).collect()
    }

    /// Decrypt every unit of `ciphertext`, in order.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Vec<u8> {
        ciphertext.iter().map(|&unit| self.decrypt_unit(unit)).collect()
    }

    fn rounds(&self, block: u8, first: u8, second: u8) -> u8 {
        let permuted = permute(u32::from(block), &Self::IP, 8) as u8;
        let mut left = permuted >> 4;
        let mut right = permuted & 0x0F;

        let previous_right = right;
        right = left ^ Self::feistel(right, first);
        left = previous_right;

        left ^= Self::feistel(right, second);

        permute(u32::from((left << 4) | right), &Self::IP_INVERSE, 8) as u8
    }
}

impl Default for BlockCipher {
    fn default() -> Self {
        Self::new(DEFAULT_CIPHER_KEY)
    }
}

/// Apply a 1-based, MSB-first position table to the low `width` bits of `value`.
fn permute(value: u32, table: &[u8], width: u32) -> u32 {
    table.iter().fold(0, |acc, &position| {
        let bit = (value >> (width - u32::from(position))) & 1;
        (acc << 1) | bit
    })
}

fn rotate_left_5(half: u32) -> u32 {
    ((half << 1) | (half >> 4)) & 0x1F
}

/// Row and column for a 4-bit group `b3 b2 b1 b0`.
///
/// The row's low bit is `b2 | b0`, not `b0` alone.
fn sbox_index(group: u8) -> (usize, usize) {
    let b3 = (group >> 3) & 1;
    let b2 = (group >> 2) & 1;
    let b1 = (group >> 1) & 1;
    let b0 = group & 1;

    let row = (b3 << 1) | (b2 | b0);
    let col = (b2 << 1) | b1;
    (usize::from(row), usize::from(col))
}
