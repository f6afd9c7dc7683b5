use {
    crate::Compiler,
    firn_core::{
        file::{FileKind, Location, OutputFile},
        tree::ClassDecl,
    },
    std::io,
};

impl Compiler
{
    /// Write a lowered class as source code instead of a class file.
    ///
    /// The source is written next to the class files.
    /// Writing over one of the input files is an error.
    pub(crate) fn print_source(&mut self, class: &ClassDecl)
        -> io::Result<Option<OutputFile>>
    {
        let file_manager = &mut self.cx.file_manager;
        let file = file_manager.output_file(Location::ClassOutput,
                                            &class.name, FileKind::Source)?;
        let overwrites_input = self.cx.input_files.iter()
            .any(|input| file_manager.is_same_file(&file, input));
        if overwrites_input {
            self.cx.log.error("source.cant.overwrite.input.file", format!(
                "error writing source; cannot overwrite input file {file}"));
            return Ok(None);
        }
        file_manager.write(&file, class.to_string().as_bytes())?;
        Ok(Some(file))
    }
}
