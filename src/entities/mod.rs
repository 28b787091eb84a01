pub mod bien;
pub mod departamento;
pub mod oficina;
pub mod resguardante;
pub mod resguardo;
pub mod sesion;
pub mod traspaso;
pub mod usuario;
