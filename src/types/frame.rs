/// Field definition for a frame type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub signed: bool,
    pub predictor: u8,
    pub encoding: u8,
}

/// Frame definition built from the `H Field <type> ...` header lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameDefinition {
    pub fields: Vec<FieldDefinition>,
}

impl FrameDefinition {
    pub fn from_field_names<S: AsRef<str>>(names: &[S]) -> Self {
        let fields = names
            .iter()
            .map(|name| FieldDefinition {
                name: name.as_ref().trim().to_string(),
                signed: false,
                predictor: 0,
                encoding: 0,
            })
            .collect();
        Self { fields }
    }

    pub fn count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn update_signed(&mut self, signed: &[bool]) {
        for (field, &s) in self.fields.iter_mut().zip(signed) {
            field.signed = s;
        }
    }

    pub fn update_predictors(&mut self, predictors: &[u8]) {
        for (field, &p) in self.fields.iter_mut().zip(predictors) {
            field.predictor = p;
        }
    }

    pub fn update_encoding(&mut self, encodings: &[u8]) {
        for (field, &e) in self.fields.iter_mut().zip(encodings) {
            field.encoding = e;
        }
    }
}

/// Rolling history of decoded main frames, used by the inter-frame predictors
#[derive(Debug, Clone)]
pub struct FrameHistory {
    pub previous: Vec<i64>,
    pub previous2: Vec<i64>,
    pub valid: bool,
}

impl FrameHistory {
    pub fn new(field_count: usize) -> Self {
        Self {
            previous: vec![0; field_count],
            previous2: vec![0; field_count],
            valid: false,
        }
    }

    /// I-frames reset both history slots to the new frame
    pub fn reset(&mut self, frame: &[i64]) {
        self.previous.copy_from_slice(frame);
        self.previous2.copy_from_slice(frame);
        self.valid = true;
    }

    pub fn push(&mut self, frame: &[i64]) {
        std::mem::swap(&mut self.previous, &mut self.previous2);
        self.previous.copy_from_slice(frame);
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}
