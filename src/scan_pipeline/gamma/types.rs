//! Gamma curve types.

/// User-supplied 8-bit transfer curves, one shared gray curve plus one per
/// color channel.
#[derive(Debug, Clone)]
pub struct GammaCurves {
    pub gray: [u8; 256],
    pub red: [u8; 256],
    pub green: [u8; 256],
    pub blue: [u8; 256],
}

impl GammaCurves {
    pub fn identity() -> Self {
        let mut curve = [0u8; 256];
        for (i, v) in curve.iter_mut().enumerate() {
            *v = i as u8;
        }
        GammaCurves {
            gray: curve,
            red: curve,
            green: curve,
            blue: curve,
        }
    }

    pub fn channel(&self, index: usize) -> &[u8; 256] {
        match index {
            0 => &self.red,
            1 => &self.green,
            _ => &self.blue,
        }
    }
}

impl Default for GammaCurves {
    fn default() -> Self {
        Self::identity()
    }
}

/// Device-resolution gamma tables, ready for upload. Channel order is
/// red/green/blue at indices 0/1/2; gray mode fills all three identically.
#[derive(Debug, Clone)]
pub struct GammaTables {
    pub red: Vec<u8>,
    pub green: Vec<u8>,
    pub blue: Vec<u8>,
}

impl GammaTables {
    pub fn channel(&self, index: usize) -> &[u8] {
        match index {
            0 => &self.red,
            1 => &self.green,
            _ => &self.blue,
        }
    }
}
